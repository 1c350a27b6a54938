use std::{
    fs::File,
    io::{Read, Seek},
    path::Path,
};

use tracing::debug;

use crate::{
    FontError,
    buffer::FontReader,
    tables::{
        Tables,
        cmap::{self, Cmap},
    },
};

/// The parts of a font the dumper cares about.
///
/// Everything is read eagerly, so a `Font` holds no file handle.
#[derive(Debug)]
pub struct Font {
    tables: Tables,
    cmap: Cmap,
}

impl Font {
    /// Opens the font file at `path` and decodes its character map.
    ///
    /// `font_index` selects a member of a TrueType collection and must be 0
    /// for a plain font file. The file is closed before this returns,
    /// whether or not parsing succeeded.
    pub fn open(path: impl AsRef<Path>, font_index: u32) -> Result<Self, FontError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| FontError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mut reader = FontReader::from_buffer(file);
        Self::from_reader(&mut reader, font_index)
    }

    /// Decodes a font from any seekable buffer.
    pub fn from_reader<B: Read + Seek>(
        reader: &mut FontReader<B>,
        font_index: u32,
    ) -> Result<Self, FontError> {
        let tables = Tables::from_reader(reader, font_index)?;

        let metadata = *tables.headers.require(cmap::TAG)?;
        debug!(
            offset = metadata.offset(),
            length = metadata.length(),
            checksum = metadata.checksum(),
            "reading cmap table"
        );
        let cmap = Cmap::from_reader(reader, &metadata)?;

        Ok(Self { tables, cmap })
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    pub fn cmap(&self) -> &Cmap {
        &self.cmap
    }
}
