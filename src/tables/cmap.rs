use std::io::{Read, Seek};

use tracing::{debug, warn};

use crate::{FontError, buffer::FontReader};

use super::{TableEncodingError, TableMetadata, Tag};

/// 'cmap'
pub const TAG: Tag = Tag::new(b"cmap");

/// A representation of the [cmap table](https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6cmap.html)
/// with every encoding subtable decoded up front.
#[derive(Debug)]
pub struct Cmap {
    /// The version of the cmap table
    /// it's almost guarenteed to be set to zero
    version: u16,

    /// The encoding subtables, in the order the font lists them
    subtables: Vec<CmapSub>,
}

impl Cmap {
    /// Reads the cmap header, its encoding records and every subtable they
    /// point at. Records sharing an offset are decoded once per record.
    pub(crate) fn from_reader<B: Read + Seek>(
        reader: &mut FontReader<B>,
        metadata: &TableMetadata,
    ) -> Result<Self, FontError> {
        reader.seek_to(metadata.offset().into())?;

        let version = reader.read_u16()?;
        let num_subtables = reader.read_u16()?;

        let mut records = Vec::with_capacity(usize::from(num_subtables));
        for _ in 0..num_subtables {
            records.push((reader.read_u16()?, reader.read_u16()?, reader.read_u32()?));
        }

        let mut subtables = Vec::with_capacity(records.len());
        for (platform_id, platform_specific_id, offset) in records {
            let available = metadata.length().checked_sub(offset).ok_or(
                TableEncodingError::MalformedSubtable {
                    format: 0,
                    reason: "encoding record points past the end of the cmap table",
                },
            )?;

            reader.seek_to(u64::from(metadata.offset()) + u64::from(offset))?;
            let subtable = Subtable::from_reader(reader, available)?;
            debug!(
                platform_id,
                platform_specific_id,
                offset,
                format = subtable.format(),
                "decoded cmap subtable"
            );

            subtables.push(CmapSub {
                platform_id,
                platform_specific_id,
                offset,
                subtable,
            });
        }

        Ok(Self { version, subtables })
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn subtables(&self) -> &[CmapSub] {
        &self.subtables
    }
}

/// A representation of the cmap [sub table](https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6cmap.html)
#[derive(Debug)]
pub struct CmapSub {
    /// The platform identifier
    platform_id: u16,

    /// The platform specific encoding identifier
    platform_specific_id: u16,

    /// The offset of the mapping table
    offset: u32,

    subtable: Subtable,
}

impl CmapSub {
    pub fn platform_id(&self) -> u16 {
        self.platform_id
    }

    pub fn platform_specific_id(&self) -> u16 {
        self.platform_specific_id
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn subtable(&self) -> &Subtable {
        &self.subtable
    }

    /// Every (code point, glyph) pair of this encoding.
    pub fn mappings(&self) -> Box<dyn Iterator<Item = Mapping> + '_> {
        self.subtable.mappings()
    }
}

/// A single character code to glyph entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    pub code_point: u32,
    pub glyph_id: u32,
}

impl Mapping {
    fn new(code_point: u32, glyph_id: u32) -> Self {
        Self {
            code_point,
            glyph_id,
        }
    }
}

/// A `startCharCode..=endCharCode` group shared by formats 12 and 13.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequentialGroup {
    pub start_char_code: u32,
    pub end_char_code: u32,
    pub glyph_id: u32,
}

/// A decoded cmap subtable.
#[derive(Debug)]
pub enum Subtable {
    /// Formats 0, 2, 4, 6 and 10, whose entries are bounded by the table
    /// size and therefore expanded while parsing.
    Explicit { format: u16, mappings: Vec<Mapping> },

    /// Format 12, the glyph id increases along each group.
    SegmentedCoverage(Vec<SequentialGroup>),

    /// Format 13, every code point of a group maps to the same glyph.
    ManyToOne(Vec<SequentialGroup>),

    /// Format 8 (mixed 16/32 bit), 14 (variation sequences, which carry no
    /// base mappings) and anything we don't recognize.
    Unsupported { format: u16 },
}

impl Subtable {
    /// Decodes the subtable under the reader's cursor. `available` is the
    /// number of cmap bytes left from the cursor, every declared size is
    /// checked against it.
    pub(crate) fn from_reader<B: Read + Seek>(
        reader: &mut FontReader<B>,
        available: u32,
    ) -> Result<Self, FontError> {
        let format = reader.read_u16()?;

        let subtable = match format {
            0 => Self::explicit(format, read_format0(reader, available)?),
            2 => Self::explicit(format, read_format2(reader, available)?),
            4 => Self::explicit(format, read_format4(reader, available)?),
            6 => Self::explicit(format, read_format6(reader, available)?),
            10 => Self::explicit(format, read_format10(reader, available)?),
            12 => Self::SegmentedCoverage(read_groups(reader, format, available)?),
            13 => Self::ManyToOne(read_groups(reader, format, available)?),
            14 => {
                debug!("skipping variation sequence subtable");
                Self::Unsupported { format }
            }
            _ => {
                warn!(format, "skipping unsupported cmap subtable format");
                Self::Unsupported { format }
            }
        };

        Ok(subtable)
    }

    fn explicit(format: u16, mappings: Vec<Mapping>) -> Self {
        Self::Explicit { format, mappings }
    }

    pub fn format(&self) -> u16 {
        match self {
            Self::Explicit { format, .. } | Self::Unsupported { format } => *format,
            Self::SegmentedCoverage(_) => 12,
            Self::ManyToOne(_) => 13,
        }
    }

    /// Every (code point, glyph) pair in table order. Group based formats
    /// are expanded lazily.
    pub fn mappings(&self) -> Box<dyn Iterator<Item = Mapping> + '_> {
        match self {
            Self::Explicit { mappings, .. } => Box::new(mappings.iter().copied()),
            Self::SegmentedCoverage(groups) => Box::new(groups.iter().flat_map(|group| {
                (group.start_char_code..=group.end_char_code).map(move |code_point| {
                    let delta = code_point - group.start_char_code;
                    Mapping::new(code_point, group.glyph_id.wrapping_add(delta))
                })
            })),
            Self::ManyToOne(groups) => Box::new(groups.iter().flat_map(|group| {
                (group.start_char_code..=group.end_char_code)
                    .map(move |code_point| Mapping::new(code_point, group.glyph_id))
            })),
            Self::Unsupported { .. } => Box::new(std::iter::empty()),
        }
    }
}

fn malformed(format: u16, reason: &'static str) -> FontError {
    TableEncodingError::MalformedSubtable { format, reason }.into()
}

fn ensure_fits(format: u16, needed: u64, available: u32) -> Result<(), FontError> {
    if needed > u64::from(available) {
        return Err(malformed(format, "declared size exceeds the cmap table"));
    }
    Ok(())
}

/// Format 0: byte encoding table, one glyph byte per code 0..=255.
fn read_format0<B: Read + Seek>(
    reader: &mut FontReader<B>,
    available: u32,
) -> Result<Vec<Mapping>, FontError> {
    ensure_fits(0, 6 + 256, available)?;

    // length, language
    reader.skip(4)?;
    let mut glyphs = [0u8; 256];
    reader.read_exact(&mut glyphs)?;

    Ok(glyphs
        .iter()
        .zip(0u32..)
        .map(|(glyph, code_point)| Mapping::new(code_point, u32::from(*glyph)))
        .collect())
}

/// Format 2: high-byte mapping through table, used by CJK multi-byte encodings.
fn read_format2<B: Read + Seek>(
    reader: &mut FontReader<B>,
    available: u32,
) -> Result<Vec<Mapping>, FontError> {
    const HEADER: u32 = 6 + 512;

    let length = u32::from(reader.read_u16()?);
    if length < HEADER {
        return Err(malformed(2, "table too short for subHeaderKeys"));
    }
    ensure_fits(2, length.into(), available)?;

    // language
    reader.skip(2)?;
    let keys = reader.read_u16_array(256)?;
    // subHeaders and glyphIndexArray, addressed in 16 bit words from here on
    let words = reader.read_u16_array(((length - HEADER) / 2) as usize)?;
    let word = |index: usize| {
        words
            .get(index)
            .copied()
            .ok_or_else(|| malformed(2, "index past the end of the subtable"))
    };

    let mut mappings = Vec::new();
    for (high_byte, key) in (0u32..).zip(keys) {
        let header = usize::from(key / 8) * 4;
        let first_code = u32::from(word(header)?);
        let entry_count = u32::from(word(header + 1)?);
        let id_delta = word(header + 2)?;
        // idRangeOffset counts bytes from its own position
        let glyphs_start = header + 3 + usize::from(word(header + 3)? / 2);

        let codes: Box<dyn Iterator<Item = (u32, u32)>> = if key == 0 {
            if high_byte < first_code || high_byte >= first_code + entry_count {
                continue;
            }
            Box::new(std::iter::once((high_byte, high_byte - first_code)))
        } else {
            let base = (high_byte << 8) + first_code;
            Box::new((0..entry_count).map(move |index| (base + index, index)))
        };

        for (code_point, index) in codes {
            let glyph = word(glyphs_start + index as usize)?;
            if glyph != 0 {
                mappings.push(Mapping::new(
                    code_point,
                    u32::from(glyph.wrapping_add(id_delta)),
                ));
            }
        }
    }

    Ok(mappings)
}

/// Format 4: segment mapping to delta values, the usual BMP table.
fn read_format4<B: Read + Seek>(
    reader: &mut FontReader<B>,
    available: u32,
) -> Result<Vec<Mapping>, FontError> {
    let length = u32::from(reader.read_u16()?);
    ensure_fits(4, length.into(), available)?;

    // language
    reader.skip(2)?;
    let seg_count = usize::from(reader.read_u16()? / 2);
    // searchRange, entrySelector, rangeShift
    reader.skip(6)?;

    let fixed = 16 + 8 * seg_count as u32;
    if length < fixed {
        return Err(malformed(4, "table too short for its segment arrays"));
    }

    let end_codes = reader.read_u16_array(seg_count)?;
    // reservedPad
    reader.skip(2)?;
    let start_codes = reader.read_u16_array(seg_count)?;
    let id_deltas = reader.read_u16_array(seg_count)?;
    let id_range_offsets = reader.read_u16_array(seg_count)?;
    let glyph_ids = reader.read_u16_array(((length - fixed) / 2) as usize)?;

    let mut mappings = Vec::new();
    for segment in 0..seg_count {
        let (start, end) = (start_codes[segment], end_codes[segment]);
        if start == 0xFFFF {
            // the terminating sentinel segment
            continue;
        }

        let delta = id_deltas[segment];
        let range_offset = usize::from(id_range_offsets[segment]);
        for code in start..=end {
            let glyph = if range_offset == 0 {
                code.wrapping_add(delta)
            } else {
                // idRangeOffset is relative to its own slot, which sits
                // `seg_count - segment` words before glyphIdArray
                let slot = range_offset / 2 + usize::from(code - start) + segment;
                match slot.checked_sub(seg_count).and_then(|index| glyph_ids.get(index)) {
                    Some(0) | None => 0,
                    Some(glyph) => glyph.wrapping_add(delta),
                }
            };
            mappings.push(Mapping::new(code.into(), glyph.into()));
        }
    }

    Ok(mappings)
}

/// Format 6: trimmed table mapping.
fn read_format6<B: Read + Seek>(
    reader: &mut FontReader<B>,
    available: u32,
) -> Result<Vec<Mapping>, FontError> {
    // length, language
    reader.skip(4)?;
    let first_code = u32::from(reader.read_u16()?);
    let entry_count = reader.read_u16()?;
    ensure_fits(6, 10 + 2 * u64::from(entry_count), available)?;

    let glyphs = reader.read_u16_array(entry_count.into())?;
    Ok((first_code..)
        .zip(glyphs)
        .map(|(code_point, glyph)| Mapping::new(code_point, glyph.into()))
        .collect())
}

/// Format 10: trimmed array, the 32 bit sibling of format 6.
fn read_format10<B: Read + Seek>(
    reader: &mut FontReader<B>,
    available: u32,
) -> Result<Vec<Mapping>, FontError> {
    // reserved, length, language
    reader.skip(10)?;
    let start_char_code = reader.read_u32()?;
    let num_chars = reader.read_u32()?;
    ensure_fits(10, 20 + 2 * u64::from(num_chars), available)?;

    let glyphs = reader.read_u16_array(num_chars as usize)?;
    Ok((start_char_code..=u32::MAX)
        .zip(glyphs)
        .map(|(code_point, glyph)| Mapping::new(code_point, glyph.into()))
        .collect())
}

/// Formats 12 and 13 share a layout, only the glyph semantics differ.
fn read_groups<B: Read + Seek>(
    reader: &mut FontReader<B>,
    format: u16,
    available: u32,
) -> Result<Vec<SequentialGroup>, FontError> {
    // reserved, length, language
    reader.skip(10)?;
    let num_groups = reader.read_u32()?;
    ensure_fits(format, 16 + 12 * u64::from(num_groups), available)?;

    let mut groups = Vec::with_capacity(num_groups as usize);
    for _ in 0..num_groups {
        let group = SequentialGroup {
            start_char_code: reader.read_u32()?,
            end_char_code: reader.read_u32()?,
            glyph_id: reader.read_u32()?,
        };
        if group.end_char_code < group.start_char_code {
            return Err(malformed(format, "group ends before it starts"));
        }
        groups.push(group);
    }

    Ok(groups)
}
