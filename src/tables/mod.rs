use std::{
    collections::BTreeMap,
    fmt,
    io::{Read, Seek},
};

use thiserror::Error;
use tracing::debug;

use crate::{FontError, buffer::FontReader};

pub mod cmap;

/// A four byte table tag such as `cmap` or `head`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag([u8; 4]);

impl Tag {
    pub const fn new(bytes: &[u8; 4]) -> Self {
        Self(*bytes)
    }

    pub const fn from_u32(value: u32) -> Self {
        Self(value.to_be_bytes())
    }

    pub const fn to_u32(self) -> u32 {
        u32::from_be_bytes(self.0)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            // Tags are printable ASCII by definition, but fonts lie
            if byte.is_ascii_graphic() || byte == b' ' {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\x{byte:02x}")?;
            }
        }
        Ok(())
    }
}

/// Tag of a TrueType collection header.
pub const COLLECTION_TAG: Tag = Tag::new(b"ttcf");

/// The sfnt versions (scalar types) we know how to read a table directory for.
/// See the [Apple Documentation Table 1](https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6.html)
const SCALAR_TYPES: [u32; 4] = [
    0x0001_0000,
    Tag::new(b"true").to_u32(),
    Tag::new(b"OTTO").to_u32(),
    Tag::new(b"typ1").to_u32(),
];

/// Represents the error messages which may occur when trying
/// to parse tables from raw binary buffers
#[derive(Error, Debug)]
pub enum TableEncodingError {
    #[error("The required buffer length for this table is {0} bytes, got {1} bytes")]
    InvalidBufferLength(usize, usize),

    #[error("Unknown sfnt scalar type {0:#010x}")]
    UnknownScalarType(u32),

    #[error("Font index {index} is out of range, the collection holds {count} fonts")]
    FontIndexOutOfRange { index: u32, count: u32 },

    #[error("The font has no '{0}' table")]
    MissingTable(Tag),

    #[error("Malformed cmap subtable (format {format}): {reason}")]
    MalformedSubtable { format: u16, reason: &'static str },
}

/// Represents the offset subtable directory and it's metadata
/// providing us with a important info such as the number of tables
#[derive(Debug)]
pub struct OffsetTable {
    scalar_type: u32,
    num_tables: u16,
}

impl OffsetTable {
    /// Constructs the offset sub table from a raw buffer
    /// the offset sub table buffer size must be 12 per the reference manual.
    pub fn from_buffer(buf: &[u8]) -> Result<Self, TableEncodingError> {
        let buf: &[u8; 12] = buf
            .try_into()
            .map_err(|_| TableEncodingError::InvalidBufferLength(12, buf.len()))?;

        let scalar_type = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
        if !SCALAR_TYPES.contains(&scalar_type) {
            return Err(TableEncodingError::UnknownScalarType(scalar_type));
        }

        // searchRange, entrySelector and rangeShift (bytes 6..12) only
        // matter for binary searching the directory, which we never do
        Ok(Self {
            scalar_type,
            num_tables: u16::from_be_bytes([buf[4], buf[5]]),
        })
    }

    /// Parses the offset table of the font starting at `font_offset`,
    /// which is 0 for a plain font file.
    pub(crate) fn from_reader<B: Read + Seek>(
        reader: &mut FontReader<B>,
        font_offset: u32,
    ) -> Result<Self, FontError> {
        reader.seek_to(font_offset.into())?;

        let mut buffer = [0u8; 12];
        reader.read_exact(&mut buffer)?;

        Ok(Self::from_buffer(&buffer)?)
    }

    pub fn scalar_type(&self) -> Tag {
        Tag::from_u32(self.scalar_type)
    }

    /// Returns the number of tables exists in the font file
    pub fn num_tables(&self) -> u16 {
        self.num_tables
    }
}

/// Represents all of the tables and their respective data types.
#[derive(Debug)]
pub struct Tables {
    /// The offset table, which provides the starting offsets of other tables.
    pub offset: OffsetTable,
    pub headers: TableDirectory,
}

impl Tables {
    /// Reads the offset table and table directory of one font.
    ///
    /// When the buffer holds a TrueType collection, `font_index` picks the
    /// member font; for a plain font file it must be 0.
    ///
    /// # Errors
    ///
    /// Fails on a short read, an unknown scalar type, or an index past the
    /// end of the collection.
    pub fn from_reader<B: Read + Seek>(
        reader: &mut FontReader<B>,
        font_index: u32,
    ) -> Result<Self, FontError> {
        let font_offset = locate_font(reader, font_index)?;
        let offset_table = OffsetTable::from_reader(reader, font_offset)?;
        debug!(
            scalar_type = %offset_table.scalar_type(),
            num_tables = offset_table.num_tables(),
            "read offset table"
        );

        let headers = TableDirectory::from_reader(reader, offset_table.num_tables())?;
        Ok(Self {
            offset: offset_table,
            headers,
        })
    }
}

/// Finds where the offset table of the requested font starts.
fn locate_font<B: Read + Seek>(
    reader: &mut FontReader<B>,
    font_index: u32,
) -> Result<u32, FontError> {
    reader.seek_to(0)?;
    let tag = Tag::from_u32(reader.read_u32()?);

    if tag != COLLECTION_TAG {
        if font_index != 0 {
            return Err(TableEncodingError::FontIndexOutOfRange {
                index: font_index,
                count: 1,
            }
            .into());
        }
        return Ok(0);
    }

    // majorVersion and minorVersion
    reader.skip(4)?;
    let count = reader.read_u32()?;
    if font_index >= count {
        return Err(TableEncodingError::FontIndexOutOfRange {
            index: font_index,
            count,
        }
        .into());
    }

    reader.skip(i64::from(font_index) * 4)?;
    let offset = reader.read_u32()?;
    debug!(font_index, count, offset, "selected font from collection");

    Ok(offset)
}

/// Represents the table headers and maps a table tag to it's offset
/// in the file / buffer
#[derive(Debug)]
pub struct TableDirectory {
    inner: BTreeMap<Tag, TableMetadata>,
}

impl TableDirectory {
    /// Reads `num_tables` 16 byte table records, starting right where the
    /// offset table ended.
    pub fn from_reader<B: Read + Seek>(
        reader: &mut FontReader<B>,
        num_tables: u16,
    ) -> Result<Self, FontError> {
        let mut buffer = vec![0u8; usize::from(num_tables) * 16];
        reader.read_exact(&mut buffer)?;

        let mut headers = BTreeMap::new();
        for raw_table in buffer.chunks_exact(16) {
            let tag = Tag::new(&[raw_table[0], raw_table[1], raw_table[2], raw_table[3]]);
            headers.insert(tag, TableMetadata::from_buffer(raw_table)?);
        }

        Ok(Self { inner: headers })
    }

    pub fn get(&self, tag: Tag) -> Option<&TableMetadata> {
        self.inner.get(&tag)
    }

    /// Like [`TableDirectory::get`], but a missing table is an error.
    pub fn require(&self, tag: Tag) -> Result<&TableMetadata, TableEncodingError> {
        self.get(tag).ok_or(TableEncodingError::MissingTable(tag))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Represents metadata for a table within a larger data structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableMetadata {
    /// The checksum of the table. This value can be used to verify the
    /// integrity of the table data.
    checksum: u32,
    /// The offset of the table, in bytes, from the beginning of the file
    /// or buffer containing the data structure. This indicates where the
    /// actual table data starts.
    offset: u32,
    /// The length of this table in bytes. This represents the actual size
    /// of the table data and does not include any padding that might be
    /// present.
    length: u32,
}

impl TableMetadata {
    /// Constructs a `TableMetadata` instance from a raw byte buffer.
    ///
    /// This method expects a buffer of exactly 16 bytes. The bytes are
    /// interpreted as follows (all values are in big-endian order):
    ///
    /// * Bytes 0-3: Tag (read separately by the directory)
    /// * Bytes 4-7: Checksum of the table
    /// * Bytes 8-11: Offset of the table from the beginning of the file
    /// * Bytes 12-15: Length of the table in bytes
    ///
    /// # Errors
    ///
    /// Returns `TableEncodingError::InvalidBufferLength` if the provided
    /// buffer is not exactly 16 bytes long.
    ///
    /// # Examples
    ///
    /// ```
    /// use codepoint_dump::tables::TableMetadata;
    ///
    /// let buffer: [u8; 16] = [
    ///     b'c', b'm', b'a', b'p', // Tag
    ///     0x12, 0x34, 0x56, 0x78, // Checksum: 0x12345678
    ///     0x00, 0x01, 0x00, 0x00, // Offset: 0x00010000
    ///     0x00, 0x00, 0x0A, 0x00, // Length: 0x00000A00
    /// ];
    ///
    /// let metadata = TableMetadata::from_buffer(&buffer).unwrap();
    /// assert_eq!(metadata.checksum(), 0x12345678);
    /// assert_eq!(metadata.offset(), 0x00010000);
    /// assert_eq!(metadata.length(), 0x00000A00);
    ///
    /// let invalid_buffer: [u8; 10] = [0; 10];
    /// assert!(TableMetadata::from_buffer(&invalid_buffer).is_err());
    /// ```
    pub fn from_buffer(buf: &[u8]) -> Result<Self, TableEncodingError> {
        let buf: &[u8; 16] = buf
            .try_into()
            .map_err(|_| TableEncodingError::InvalidBufferLength(16, buf.len()))?;

        Ok(Self {
            checksum: u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]),
            offset: u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]),
            length: u32::from_be_bytes([buf[12], buf[13], buf[14], buf[15]]),
        })
    }

    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn length(&self) -> u32 {
        self.length
    }
}
