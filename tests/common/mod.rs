//! Builds tiny sfnt files holding nothing but a `cmap` table.

use std::path::{Path, PathBuf};

/// One cmap subtable, serialized by [`FontBuilder::build`].
pub enum TestSubtable {
    /// Format 4 segments as (start, end, glyph of start) with plain deltas.
    Format4(Vec<(u16, u16, u16)>),
    /// Format 12 groups as (start, end, glyph of start).
    Format12(Vec<(u32, u32, u32)>),
}

impl TestSubtable {
    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            Self::Format4(segments) => {
                let mut segments = segments.clone();
                segments.push((0xFFFF, 0xFFFF, 1));

                let seg_count = segments.len() as u16;
                let length = 16 + 8 * seg_count;
                push16(&mut out, &[4, length, 0, seg_count * 2, 0, 0, 0]);
                push16(&mut out, &segments.iter().map(|s| s.1).collect::<Vec<_>>());
                push16(&mut out, &[0]);
                push16(&mut out, &segments.iter().map(|s| s.0).collect::<Vec<_>>());
                push16(
                    &mut out,
                    &segments
                        .iter()
                        .map(|s| s.2.wrapping_sub(s.0))
                        .collect::<Vec<_>>(),
                );
                push16(&mut out, &vec![0; segments.len()]);
            }
            Self::Format12(groups) => {
                push16(&mut out, &[12, 0]);
                push32(&mut out, &[16 + 12 * groups.len() as u32, 0, groups.len() as u32]);
                for (start, end, glyph) in groups {
                    push32(&mut out, &[*start, *end, *glyph]);
                }
            }
        }
        out
    }
}

#[derive(Default)]
pub struct FontBuilder {
    subtables: Vec<(u16, u16, TestSubtable)>,
}

impl FontBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subtable(mut self, platform_id: u16, encoding_id: u16, subtable: TestSubtable) -> Self {
        self.subtables.push((platform_id, encoding_id, subtable));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let bodies: Vec<Vec<u8>> = self.subtables.iter().map(|(_, _, s)| s.to_bytes()).collect();

        let mut cmap = Vec::new();
        push16(&mut cmap, &[0, self.subtables.len() as u16]);
        let mut offset = 4 + 8 * self.subtables.len() as u32;
        for ((platform_id, encoding_id, _), body) in self.subtables.iter().zip(&bodies) {
            push16(&mut cmap, &[*platform_id, *encoding_id]);
            push32(&mut cmap, &[offset]);
            offset += body.len() as u32;
        }
        for body in &bodies {
            cmap.extend_from_slice(body);
        }

        let mut font = Vec::new();
        push32(&mut font, &[0x0001_0000]);
        push16(&mut font, &[1, 16, 0, 0]);
        font.extend_from_slice(b"cmap");
        push32(&mut font, &[0, 12 + 16, cmap.len() as u32]);
        font.extend_from_slice(&cmap);
        font
    }

    pub fn write_to(&self, dir: &Path) -> PathBuf {
        let path = dir.join("test-font.ttf");
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}

fn push16(out: &mut Vec<u8>, values: &[u16]) {
    for value in values {
        out.extend_from_slice(&value.to_be_bytes());
    }
}

fn push32(out: &mut Vec<u8>, values: &[u32]) {
    for value in values {
        out.extend_from_slice(&value.to_be_bytes());
    }
}
