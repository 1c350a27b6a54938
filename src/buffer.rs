use std::io::{self, BufReader, Read, Seek, SeekFrom};

use thiserror::Error;

macro_rules! impl_read {
    ($fn_name:ident, $typ:ty) => {
        pub fn $fn_name(&mut self) -> Result<$typ, FontReaderError> {
            let mut buf = [0u8; size_of::<$typ>()];
            self.inner.read_exact(&mut buf)?;

            Ok(<$typ>::from_be_bytes(buf))
        }
    };
}

/// Represents the possible errors that can occur when using `FontReader`.
#[derive(Error, Debug)]
pub enum FontReaderError {
    /// An error occurred during a read operation on the underlying buffer.
    /// This variant transparently wraps `std::io::Error`.
    #[error(transparent)]
    ReadError(#[from] io::Error),

    /// An error occurred during a seek operation on the underlying buffer.
    #[error("Failed to seek, error context: {0}")]
    FailedToSeek(io::Error),
}

/// A big-endian reader over a seekable font buffer.
///
/// Every multi-byte value in an sfnt file is stored big-endian, so the
/// `read_*` helpers decode accordingly.
pub struct FontReader<B: Read + Seek> {
    inner: BufReader<B>,
}

impl<B> FontReader<B>
where
    B: Read + Seek,
{
    /// Wraps anything seekable, most commonly a `File`,
    /// though a `Cursor` over an in-memory font works just as well.
    pub fn from_buffer(buffer: B) -> Self {
        Self {
            inner: BufReader::new(buffer),
        }
    }

    /// Seeks to an absolute position from the start of the buffer.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    /// use codepoint_dump::buffer::FontReader;
    ///
    /// let data = vec![0, 0, 0, 10, 0, 0, 0, 20];
    /// let mut reader = FontReader::from_buffer(Cursor::new(data));
    ///
    /// reader.seek_to(4).unwrap();
    /// assert_eq!(reader.read_u32().unwrap(), 20);
    /// ```
    pub fn seek_to(&mut self, pos: u64) -> Result<(), FontReaderError> {
        self.inner
            .seek(SeekFrom::Start(pos))
            .map_err(FontReaderError::FailedToSeek)?;

        Ok(())
    }

    /// Skips n bytes from the CURRENT cursor position.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    /// use codepoint_dump::buffer::FontReader;
    ///
    /// let data = vec![0, 0, 0, 10, 0, 0, 0, 20];
    /// let mut reader = FontReader::from_buffer(Cursor::new(data));
    ///
    /// assert_eq!(reader.read_u32().unwrap(), 10);
    /// reader.skip(4).unwrap();
    ///
    /// // Nothing left to read
    /// assert!(reader.read_u32().is_err());
    /// ```
    pub fn skip(&mut self, n: i64) -> Result<(), FontReaderError> {
        self.inner
            .seek_relative(n)
            .map_err(FontReaderError::FailedToSeek)?;

        Ok(())
    }

    /// Fills `buf` completely, failing on a short read.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), FontReaderError> {
        self.inner.read_exact(buf)?;

        Ok(())
    }

    /// Reads `count` consecutive big-endian `u16` values.
    pub fn read_u16_array(&mut self, count: usize) -> Result<Vec<u16>, FontReaderError> {
        let mut raw = vec![0u8; count * 2];
        self.inner.read_exact(&mut raw)?;

        Ok(raw
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect())
    }

    impl_read!(read_u16, u16);
    impl_read!(read_u32, u32);
}
