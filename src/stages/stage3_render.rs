use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::io::{PlainText, write_proceeding_xml};
use crate::models::Proceeding;

/// Configuration for Stage 3 rendering
#[derive(Debug, Clone)]
pub struct Stage3Config {
    /// Whether to write the corpus XML
    pub generate_xml: bool,
    /// Whether to write the plain-text reading view
    pub generate_text: bool,
}

impl Default for Stage3Config {
    fn default() -> Self {
        Self {
            generate_xml: true,
            generate_text: false,
        }
    }
}

/// Result of Stage 3 rendering
#[derive(Debug, Default)]
pub struct Stage3Result {
    /// Path to the corpus XML (if generated)
    pub xml_path: Option<PathBuf>,
    /// Path to the text view (if generated)
    pub text_path: Option<PathBuf>,
}

/// Execute Stage 3: Rendering
///
/// Produces up to two views of a proceeding:
/// 1. Corpus XML: one node per line, read back by the corpus reader
/// 2. Plain text: section headings, speaker labels and wrapped paragraphs
pub fn execute_stage3(
    proceeding: &Proceeding,
    xml_output: Option<&Path>,
    text_output: Option<&Path>,
    config: &Stage3Config,
) -> Result<Stage3Result> {
    let mut result = Stage3Result::default();

    if config.generate_xml {
        if let Some(path) = xml_output {
            info!("Writing corpus XML to {:?}", path);
            write_proceeding_xml(proceeding, path)?;
            result.xml_path = Some(path.to_path_buf());
        }
    }

    if config.generate_text {
        if let Some(path) = text_output {
            info!("Writing text view to {:?}", path);
            PlainText::new(proceeding).write_file(path)?;
            result.text_path = Some(path.to_path_buf());
        }
    }

    Ok(result)
}
