use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::info;

use crate::{Config, FontError, font::Font};

/// Errors that end a dump run. Code points that aren't valid characters are
/// not errors, they're simply skipped.
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("Failed to parse font: {0}")]
    FontParse(#[from] FontError),

    #[error("Failed to create output directory {}: {source}", path.display())]
    CreateOutputDir { path: PathBuf, source: io::Error },

    #[error("Failed to write {}: {source}", path.display())]
    WriteCodepoint { path: PathBuf, source: io::Error },
}

/// What a finished run did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DumpSummary {
    /// Encoding subtables visited.
    pub tables: usize,
    /// Files written, counting code points repeated across subtables
    /// once per write.
    pub files_written: usize,
}

/// Writes one file per character a font maps, named by the decimal code
/// point and holding that character's UTF-8 bytes.
#[derive(Debug, Clone)]
pub struct CodepointDumper {
    config: Config,
}

impl CodepointDumper {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the dump once.
    ///
    /// The output directory is created first, then the font is parsed, then
    /// every entry of every cmap subtable is written in table order, so a
    /// code point listed by several subtables ends up with the last write.
    /// Any error aborts the run.
    pub fn run(&self) -> Result<DumpSummary, DumpError> {
        let output_dir = self.config.output_dir();
        fs::create_dir_all(output_dir).map_err(|source| DumpError::CreateOutputDir {
            path: output_dir.to_path_buf(),
            source,
        })?;

        info!(font = %self.config.font_path().display(), "dumping code points");
        let font = Font::open(self.config.font_path(), self.config.font_index)?;

        let mut summary = DumpSummary::default();
        for subtable in font.cmap().subtables() {
            summary.tables += 1;

            for mapping in subtable.mappings() {
                // surrogates and anything past U+10FFFF
                let Some(character) = char::from_u32(mapping.code_point) else {
                    continue;
                };

                write_codepoint(output_dir, mapping.code_point, character)?;
                summary.files_written += 1;
            }
        }

        info!(
            tables = summary.tables,
            files_written = summary.files_written,
            output_dir = %output_dir.display(),
            "finished dumping code points"
        );
        Ok(summary)
    }
}

/// The file name a code point is written under.
pub fn output_file_name(code_point: u32) -> String {
    code_point.to_string()
}

fn write_codepoint(output_dir: &Path, code_point: u32, character: char) -> Result<(), DumpError> {
    let path = output_dir.join(output_file_name(code_point));
    let mut utf8 = [0u8; 4];

    fs::write(&path, character.encode_utf8(&mut utf8).as_bytes())
        .map_err(|source| DumpError::WriteCodepoint { path, source })
}
