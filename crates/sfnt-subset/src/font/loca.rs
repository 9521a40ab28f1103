//! `loca` table processing.

use core::ops;

use super::Cursor;
use crate::{errors::ParseErrorKind, ParseError};

/// Format of offsets in the `loca` table, as specified by `indexToLocFormat` in the `head` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocaFormat {
    /// Offsets are divided by 2 and stored as `u16`s.
    Short,
    /// Offsets are stored as `u32`s.
    Long,
}

impl LocaFormat {
    const fn bytes_per_offset(self) -> usize {
        match self {
            Self::Short => 2,
            Self::Long => 4,
        }
    }

    pub(crate) const fn to_raw(self) -> u16 {
        match self {
            Self::Short => 0,
            Self::Long => 1,
        }
    }
}

/// Parsed `loca` table.
#[derive(Debug, Clone, Copy)]
pub struct LocaTable<'a> {
    format: LocaFormat,
    cursor: Cursor<'a>,
    glyph_count: u16,
}

impl<'a> LocaTable<'a> {
    pub(crate) fn parse(
        cursor: Cursor<'a>,
        format: LocaFormat,
        glyph_count: u16,
    ) -> Result<Self, ParseError> {
        let expected_len = (usize::from(glyph_count) + 1) * format.bytes_per_offset();
        if cursor.bytes.len() < expected_len {
            return Err(cursor.err(ParseErrorKind::UnexpectedTableLen {
                expected: expected_len,
                actual: cursor.bytes.len(),
            }));
        }
        Ok(Self {
            format,
            cursor,
            glyph_count,
        })
    }

    /// Returns the offset format of this table.
    pub fn format(&self) -> LocaFormat {
        self.format
    }

    /// Returns the number of glyphs covered by this table.
    pub fn glyph_count(&self) -> u16 {
        self.glyph_count
    }

    /// Returns the offset of the glyph data in the `glyf` table. `idx` may be equal to the glyph count,
    /// in which case the end offset of the last glyph is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if `idx` exceeds the glyph count.
    pub fn offset(&self, idx: u16) -> Result<usize, ParseError> {
        if idx > self.glyph_count {
            return Err(ParseError::glyph_out_of_range(idx, self.glyph_count));
        }
        let bytes_per_offset = self.format.bytes_per_offset();
        let start = usize::from(idx) * bytes_per_offset;
        let mut cursor = self.cursor.range(start..start + bytes_per_offset)?;
        Ok(match self.format {
            LocaFormat::Short => usize::from(cursor.read_u16()?) * 2,
            LocaFormat::Long => cursor.read_u32()? as usize,
        })
    }

    /// Returns the range of the glyph data in the `glyf` table.
    ///
    /// # Errors
    ///
    /// Returns an error if `glyph_idx` is out of range, or the offsets are not monotonic.
    pub fn glyph_range(&self, glyph_idx: u16) -> Result<ops::Range<usize>, ParseError> {
        if glyph_idx >= self.glyph_count {
            return Err(ParseError::glyph_out_of_range(glyph_idx, self.glyph_count));
        }
        let start = self.offset(glyph_idx)?;
        let end = self.offset(glyph_idx + 1)?;
        if start > end {
            return Err(self.cursor.err(ParseErrorKind::OffsetOutOfBounds(start)));
        }
        Ok(start..end)
    }
}
