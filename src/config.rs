use std::path::{Path, PathBuf};

/// Font read when no other path is configured.
pub const DEFAULT_FONT_PATH: &str = "JF-Dot-Kappa20-0213.ttf";

/// Directory the per code point files land in by default.
pub const DEFAULT_OUTPUT_DIR: &str = "texts";

/// Where to read the font from and where to write the code point files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub font_path: PathBuf,
    pub output_dir: PathBuf,
    /// Member of a TrueType collection to read, 0 for plain font files.
    pub font_index: u32,
}

impl Config {
    pub fn new(font_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            font_path: font_path.into(),
            output_dir: output_dir.into(),
            font_index: 0,
        }
    }

    pub fn with_font_index(mut self, font_index: u32) -> Self {
        self.font_index = font_index;
        self
    }

    pub fn font_path(&self) -> &Path {
        &self.font_path
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_FONT_PATH, DEFAULT_OUTPUT_DIR)
    }
}
