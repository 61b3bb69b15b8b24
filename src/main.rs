use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use plenum::{
    FilterConfig, Language, MetadataTables, ProceedingStats, SourceLanguage, Stage1Config,
    Stage2Config, Stage3Config, collect_files, execute_filter, execute_stage1, execute_stage2,
    execute_stage3, page_id, parse_proceeding_file, read_html_page,
};

#[derive(Parser)]
#[command(name = "plenum")]
#[command(author, version, about = "European Parliament plenary transcript corpus pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract plenary HTML pages into corpus XML
    Extract {
        /// Directory of downloaded HTML pages
        #[arg(short, long)]
        input: PathBuf,

        /// Directory for the corpus XML files
        #[arg(short, long)]
        output: PathBuf,

        /// Glob pattern selecting pages inside the input directory
        #[arg(long, default_value = "*.html")]
        pattern: String,

        /// Edition language of the pages
        #[arg(short, long, default_value = "en")]
        language: Language,

        /// Lexicon file replacing the embedded one (TOML)
        #[arg(long)]
        lexicon: Option<PathBuf>,

        /// Also write a plain-text view next to each XML file
        #[arg(long)]
        text: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Attach member biographies from metadata tables
    MergeMetadata {
        /// Directory of corpus XML files
        #[arg(short, long)]
        input: PathBuf,

        /// Directory for the enriched XML files
        #[arg(short, long)]
        output: PathBuf,

        /// Member table (TSV)
        #[arg(long)]
        meps: PathBuf,

        /// National party memberships (TSV)
        #[arg(long)]
        parties: Option<PathBuf>,

        /// Political group memberships (TSV)
        #[arg(long)]
        groups: Option<PathBuf>,

        /// Glob pattern selecting files inside the input directory
        #[arg(long, default_value = "*.xml")]
        pattern: String,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Keep only paragraphs from one source language
    Filter {
        /// Directory of corpus XML files
        #[arg(short, long)]
        input: PathBuf,

        /// Directory for the filtered XML files
        #[arg(short, long)]
        output: PathBuf,

        /// Source language to keep: a language code, or "all" for every
        /// language other than the edition's
        #[arg(short, long, default_value = "all")]
        source: SourceLanguage,

        /// Keep only paragraphs by speakers native to the paragraph language
        #[arg(long)]
        native: bool,

        /// Glob pattern selecting files inside the input directory
        #[arg(long, default_value = "*.xml")]
        pattern: String,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print counts for corpus XML files
    Inspect {
        /// Directory of corpus XML files
        #[arg(short, long)]
        input: PathBuf,

        /// Glob pattern selecting files inside the input directory
        #[arg(long, default_value = "*.xml")]
        pattern: String,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            input,
            output,
            pattern,
            language,
            lexicon,
            text,
            verbose,
        } => {
            setup_logging(verbose);
            let config = Stage1Config {
                language,
                lexicon_path: lexicon,
            };
            extract_pages(&input, &output, &pattern, &config, text)
        }
        Commands::MergeMetadata {
            input,
            output,
            meps,
            parties,
            groups,
            pattern,
            verbose,
        } => {
            setup_logging(verbose);
            let config = Stage2Config {
                meps,
                national_parties: parties,
                political_groups: groups,
            };
            merge_metadata(&input, &output, &pattern, &config)
        }
        Commands::Filter {
            input,
            output,
            source,
            native,
            pattern,
            verbose,
        } => {
            setup_logging(verbose);
            filter_corpus(&input, &output, &pattern, &FilterConfig { source, native })
        }
        Commands::Inspect {
            input,
            pattern,
            json,
            verbose,
        } => {
            setup_logging(verbose);
            inspect_corpus(&input, &pattern, json)
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

#[derive(Debug, Default)]
struct BatchSummary {
    processed: usize,
    failed: usize,
}

/// Run `process` over every file. Page-level failures are logged and
/// counted; anything else aborts the run.
fn run_batch<F>(files: &[PathBuf], mut process: F) -> Result<BatchSummary>
where
    F: FnMut(&Path) -> plenum::Result<()>,
{
    let mut summary = BatchSummary::default();
    for path in files {
        match process(path) {
            Ok(()) => summary.processed += 1,
            Err(e) if e.is_page_local() => {
                warn!("Skipping {}: {}", path.display(), e);
                summary.failed += 1;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to process {}", path.display()));
            }
        }
    }
    Ok(summary)
}

fn input_files(input: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let files = collect_files(input, pattern)
        .with_context(|| format!("Failed to list {:?} in {:?}", pattern, input))?;
    info!("Found {} files matching {:?} in {:?}", files.len(), pattern, input);
    Ok(files)
}

fn prepare_output(output: &Path) -> Result<()> {
    std::fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory {:?}", output))
}

fn extract_pages(
    input: &Path,
    output: &Path,
    pattern: &str,
    config: &Stage1Config,
    text: bool,
) -> Result<()> {
    let lexicon = config.load_lexicon().context("Failed to load lexicon")?;
    info!("Lexicon loaded for {}", lexicon.language());

    let files = input_files(input, pattern)?;
    prepare_output(output)?;

    let render = Stage3Config {
        generate_xml: true,
        generate_text: text,
    };
    let mut interventions = 0;

    let summary = run_batch(&files, |path| {
        let page = page_id(path);
        let html = read_html_page(path)?;

        let result = execute_stage1(&html, &page, &lexicon)?;
        interventions += result.proceeding.interventions().count();

        let xml_path = output.join(format!("{}.xml", page));
        let text_path = output.join(format!("{}.txt", page));
        execute_stage3(&result.proceeding, Some(&xml_path), Some(&text_path), &render)?;
        Ok(())
    })?;

    info!(
        "Extraction complete: {} pages processed, {} failed, {} interventions",
        summary.processed, summary.failed, interventions
    );
    Ok(())
}

fn merge_metadata(input: &Path, output: &Path, pattern: &str, config: &Stage2Config) -> Result<()> {
    let tables = MetadataTables::load(config).context("Failed to load metadata tables")?;

    let files = input_files(input, pattern)?;
    prepare_output(output)?;

    let mut enriched = 0;
    let mut unknown = Vec::new();

    let summary = run_batch(&files, |path| {
        let mut proceeding = parse_proceeding_file(path)?;
        let result = execute_stage2(&mut proceeding, &tables);
        enriched += result.interventions_enriched;
        for speaker in result.unknown_speakers {
            if !unknown.contains(&speaker) {
                warn!("{}: speaker {} not in member table", proceeding.id, speaker);
                unknown.push(speaker);
            }
        }
        write_corpus_file(&proceeding, output, path)
    })?;

    info!(
        "Metadata merge complete: {} files processed, {} failed, {} interventions enriched, {} unknown speakers",
        summary.processed,
        summary.failed,
        enriched,
        unknown.len()
    );
    Ok(())
}

fn filter_corpus(input: &Path, output: &Path, pattern: &str, config: &FilterConfig) -> Result<()> {
    info!(
        "Filtering for source language {} (native: {})",
        config.source, config.native
    );

    let files = input_files(input, pattern)?;
    prepare_output(output)?;

    let mut kept = 0;
    let mut removed = 0;

    let summary = run_batch(&files, |path| {
        let mut proceeding = parse_proceeding_file(path)?;
        let result = execute_filter(&mut proceeding, config);
        kept += result.paragraphs_kept;
        removed += result.paragraphs_removed;
        write_corpus_file(&proceeding, output, path)
    })?;

    info!(
        "Filter complete: {} files processed, {} failed, {} paragraphs kept, {} removed",
        summary.processed, summary.failed, kept, removed
    );
    Ok(())
}

/// Write a proceeding under `output` with the input file's name
fn write_corpus_file(
    proceeding: &plenum::Proceeding,
    output: &Path,
    source: &Path,
) -> plenum::Result<()> {
    let name = source
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(format!("{}.xml", proceeding.id)));
    execute_stage3(
        proceeding,
        Some(&output.join(name)),
        None,
        &Stage3Config::default(),
    )?;
    Ok(())
}

fn inspect_corpus(input: &Path, pattern: &str, json: bool) -> Result<()> {
    let files = input_files(input, pattern)?;

    let mut stats = Vec::with_capacity(files.len());
    let summary = run_batch(&files, |path| {
        let proceeding = parse_proceeding_file(path)?;
        stats.push(ProceedingStats::from_proceeding(&proceeding));
        Ok(())
    })?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&stats).context("Failed to serialize statistics")?
        );
    } else {
        for entry in &stats {
            println!("{}", entry.format_text());
        }
    }

    info!(
        "Inspected {} files, {} failed",
        summary.processed, summary.failed
    );
    Ok(())
}
