pub mod error;
pub mod heuristics;
pub mod io;
pub mod models;
pub mod stages;

pub use error::{CorpusError, Result};
pub use io::{
    PlainText, ProceedingStats, collect_files, page_id, parse_proceeding_file, read_html_page,
    write_proceeding_xml,
};
pub use models::{Language, Lexicon, LexiconSet, Proceeding};
pub use stages::{
    FilterConfig, MetadataTables, SourceLanguage, Stage1Config, Stage2Config, Stage3Config,
    execute_filter, execute_stage1, execute_stage2, execute_stage3, normalize_text,
};
