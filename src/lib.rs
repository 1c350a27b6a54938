use std::{io, path::PathBuf};

use buffer::FontReaderError;
use tables::TableEncodingError;
use thiserror::Error;

pub mod buffer;
pub mod config;
pub mod dumper;
pub mod font;
pub mod tables;

pub use config::Config;
pub use dumper::{CodepointDumper, DumpError, DumpSummary};
pub use font::Font;

/// Anything that can go wrong while loading a font: the file itself,
/// short reads, or structurally invalid tables.
#[derive(Debug, Error)]
pub enum FontError {
    #[error("Failed to open font {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error(transparent)]
    TableEncoding(#[from] TableEncodingError),

    #[error(transparent)]
    FontReader(#[from] FontReaderError),
}
