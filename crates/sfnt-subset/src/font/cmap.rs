//! `cmap` table processing.

use core::{fmt, str::FromStr};

use super::Cursor;
use crate::{
    errors::{MapError, ParseErrorKind},
    ParseError,
};

/// Platform and encoding IDs identifying a `cmap` subtable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CmapId {
    /// Platform ID.
    pub platform_id: u16,
    /// Platform-specific encoding ID.
    pub encoding_id: u16,
}

impl CmapId {
    /// Unicode platform, BMP only.
    pub const UNICODE_BMP: Self = Self::new(0, 3);
    /// Unicode platform, full repertoire.
    pub const UNICODE_FULL: Self = Self::new(0, 4);
    /// Macintosh platform, Roman encoding.
    pub const MAC_ROMAN: Self = Self::new(1, 0);
    /// Windows platform, Unicode BMP.
    pub const WINDOWS_BMP: Self = Self::new(3, 1);
    /// Windows platform, Unicode full repertoire (UCS-4).
    pub const WINDOWS_UCS4: Self = Self::new(3, 10);

    pub(crate) const UNICODE_PLATFORM: u16 = 0;
    pub(crate) const WINDOWS_PLATFORM: u16 = 3;

    /// Creates an ID from the platform and encoding IDs.
    pub const fn new(platform_id: u16, encoding_id: u16) -> Self {
        Self {
            platform_id,
            encoding_id,
        }
    }

    /// Checks whether subtables with this ID cover the full Unicode repertoire rather than only the BMP.
    pub fn is_ucs4(self) -> bool {
        matches!(
            (self.platform_id, self.encoding_id),
            (Self::UNICODE_PLATFORM, 4 | 6) | (Self::WINDOWS_PLATFORM, 10)
        )
    }
}

impl fmt::Display for CmapId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{},{}", self.platform_id, self.encoding_id)
    }
}

/// Error parsing a [`CmapId`] from a string.
#[derive(Debug)]
#[non_exhaustive]
pub struct CmapIdParseError;

impl fmt::Display for CmapIdParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("expected `platformId,encodingId`, e.g. `3,1`")
    }
}

impl std::error::Error for CmapIdParseError {}

/// Parses IDs in the `platformId,encodingId` form, e.g. `3,1`.
impl FromStr for CmapId {
    type Err = CmapIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (platform_id, encoding_id) = s.split_once(',').ok_or(CmapIdParseError)?;
        let platform_id = platform_id.trim().parse().map_err(|_| CmapIdParseError)?;
        let encoding_id = encoding_id.trim().parse().map_err(|_| CmapIdParseError)?;
        Ok(Self::new(platform_id, encoding_id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SegmentWithDelta {
    pub(crate) start_code: u16,
    pub(crate) end_code: u16,
    pub(crate) id_delta: u16,
    pub(crate) id_range_offset: u16,
}

/// Segment mapping to delta values (format 4) subtable of the `cmap` table.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct SegmentDeltas {
    pub(crate) segments: Vec<SegmentWithDelta>,
    pub(crate) glyph_id_array: Vec<u16>,
}

impl SegmentDeltas {
    pub(crate) const FORMAT: u16 = 4;

    fn parse(mut cursor: Cursor<'_>) -> Result<Self, ParseError> {
        cursor.read_u16_checked(|format| {
            if format != Self::FORMAT {
                return Err(ParseErrorKind::UnexpectedTableFormat(format));
            }
            Ok(())
        })?;

        let remaining_len = cursor.read_u16_checked(|subtable_len| {
            Ok(subtable_len
                .checked_sub(4)
                .ok_or(ParseErrorKind::UnexpectedEof)? as usize)
        })?;
        // Some fonts have a saturated `length` for large subtables, so we don't require an exact match.
        let remaining_len = remaining_len.min(cursor.bytes.len());
        cursor = cursor.range(0..remaining_len)?;

        cursor.skip(2)?; // language
        let segment_count = cursor.read_u16()? / 2;
        cursor.skip(6)?; // searchRange, entrySelector, rangeShift

        let vec_len = 2 * usize::from(segment_count);
        let mut end_codes = cursor.split_at(vec_len)?;
        cursor.skip(2)?; // reserved padding
        let mut start_codes = cursor.split_at(vec_len)?;
        let mut id_deltas = cursor.split_at(vec_len)?;
        let mut id_range_offsets = cursor.split_at(vec_len)?;

        let segments = (0..segment_count).map(|_| {
            Ok(SegmentWithDelta {
                start_code: start_codes.read_u16()?,
                end_code: end_codes.read_u16()?,
                id_delta: id_deltas.read_u16()?,
                id_range_offset: id_range_offsets.read_u16()?,
            })
        });
        let segments = segments.collect::<Result<_, ParseError>>()?;

        let glyph_id_array = (0..cursor.bytes.len() / 2).map(|_| cursor.read_u16());
        Ok(Self {
            segments,
            glyph_id_array: glyph_id_array.collect::<Result<_, ParseError>>()?,
        })
    }

    fn map_char(&self, ch: char) -> Result<u16, MapError> {
        let c = u16::try_from(u32::from(ch)).map_err(|_| MapError::CharTooLarge)?;

        let segment_idx = self
            .segments
            .binary_search_by_key(&c, |segment| segment.end_code)
            .unwrap_or_else(|pos| pos);
        let Some(segment) = self.segments.get(segment_idx) else {
            return Ok(0); // `c` exceeds `end_code` for the last segment
        };
        if segment.start_code > c {
            return Ok(0); // missing glyph
        }
        self.map_in_segment(segment_idx, c)
    }

    fn map_in_segment(&self, segment_idx: usize, c: u16) -> Result<u16, MapError> {
        let segment = &self.segments[segment_idx];
        if segment.id_range_offset == 0 {
            return Ok(segment.id_delta.wrapping_add(c));
        }

        // Offset is counted in words from the `idRangeOffset` entry of the segment
        let word_offset = segment_idx
            + usize::from(segment.id_range_offset / 2)
            + usize::from(c - segment.start_code);
        // Shift the offset to count from the start of `glyphIdArray`
        let array_idx = word_offset
            .checked_sub(self.segments.len())
            .ok_or(MapError::InvalidOffset)?;
        let glyph_id = *self
            .glyph_id_array
            .get(array_idx)
            .ok_or(MapError::InvalidOffset)?;
        Ok(if glyph_id == 0 {
            0
        } else {
            segment.id_delta.wrapping_add(glyph_id)
        })
    }

    fn mappings(&self) -> Vec<(char, u16)> {
        let mut mappings = vec![];
        for (segment_idx, segment) in self.segments.iter().enumerate() {
            for c in segment.start_code..=segment.end_code {
                let Some(ch) = char::from_u32(c.into()) else {
                    continue; // surrogate code points
                };
                match self.map_in_segment(segment_idx, c) {
                    Ok(0) | Err(_) => { /* unmapped */ }
                    Ok(glyph_id) => mappings.push((ch, glyph_id)),
                }
            }
        }
        mappings
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SequentialMapGroup {
    pub(crate) start_char_code: u32,
    pub(crate) end_char_code: u32,
    pub(crate) start_glyph_id: u32,
}

impl SequentialMapGroup {
    pub(crate) fn map_unchecked(&self, ch: char) -> u32 {
        u32::from(ch) - self.start_char_code + self.start_glyph_id
    }
}

/// Segmented coverage (format 12) subtable of the `cmap` table.
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct SegmentedCoverage {
    pub(crate) groups: Vec<SequentialMapGroup>,
}

impl SegmentedCoverage {
    pub(crate) const FORMAT: u16 = 12;

    fn parse(mut cursor: Cursor<'_>) -> Result<Self, ParseError> {
        cursor.read_u16_checked(|format| {
            if format != Self::FORMAT {
                return Err(ParseErrorKind::UnexpectedTableFormat(format));
            }
            Ok(())
        })?;

        cursor.skip(2)?; // reserved

        let remaining_len = cursor.read_u32_checked(|subtable_len| {
            Ok(subtable_len
                .checked_sub(8)
                .ok_or(ParseErrorKind::UnexpectedEof)? as usize)
        })?;
        cursor = cursor.range(0..remaining_len)?;

        cursor.skip(4)?; // language
        let num_groups = cursor.read_u32()?;
        let groups = (0..num_groups).map(|_| {
            Ok(SequentialMapGroup {
                start_char_code: cursor.read_u32()?,
                end_char_code: cursor.read_u32()?,
                start_glyph_id: cursor.read_u32()?,
            })
        });

        Ok(Self {
            groups: groups.collect::<Result<_, ParseError>>()?,
        })
    }

    fn map_char(&self, ch: char) -> u16 {
        let ch_code = u32::from(ch);
        let group_idx = self
            .groups
            .binary_search_by_key(&ch_code, |group| group.end_char_code)
            .unwrap_or_else(|pos| pos);
        let Some(group) = self.groups.get(group_idx) else {
            return 0; // `ch` exceeds `end_char_code` for the last segment
        };
        if group.start_char_code > ch_code {
            return 0; // missing glyph
        }
        u16::try_from(group.map_unchecked(ch)).unwrap_or(0)
    }

    fn mappings(&self) -> Vec<(char, u16)> {
        let chars = self.groups.iter().flat_map(|group| {
            (group.start_char_code..=group.end_char_code)
                .filter_map(char::from_u32)
                .map(move |ch| (ch, group.map_unchecked(ch)))
        });
        chars
            .filter_map(|(ch, glyph_id)| Some((ch, u16::try_from(glyph_id).ok()?)))
            .filter(|&(_, glyph_id)| glyph_id != 0)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SubtableData {
    Deltas(SegmentDeltas),
    Coverage(SegmentedCoverage),
    Unsupported,
}

/// Subtable of the [`CmapTable`].
#[derive(Debug, Clone)]
pub struct CmapSubtable {
    id: CmapId,
    format: u16,
    data: SubtableData,
}

impl CmapSubtable {
    fn parse(id: CmapId, cursor: Cursor<'_>) -> Result<Self, ParseError> {
        let mut peek = cursor;
        let format = peek.read_u16()?;
        let data = match format {
            SegmentDeltas::FORMAT => SubtableData::Deltas(SegmentDeltas::parse(cursor)?),
            SegmentedCoverage::FORMAT => SubtableData::Coverage(SegmentedCoverage::parse(cursor)?),
            _ => SubtableData::Unsupported,
        };
        Ok(Self { id, format, data })
    }

    /// Returns the platform and encoding IDs of this subtable.
    pub fn id(&self) -> CmapId {
        self.id
    }

    /// Returns the subtable format (e.g., 4 for segment mapping to delta values).
    pub fn format(&self) -> u16 {
        self.format
    }

    /// Checks whether this subtable has a format that can be read by this crate (format 4 or 12).
    pub fn is_supported(&self) -> bool {
        !matches!(self.data, SubtableData::Unsupported)
    }

    /// Maps a char to a glyph ID. Chars not covered by the subtable are mapped to glyph 0
    /// (the missing glyph). Subtables with unsupported formats map all chars to glyph 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the char cannot be represented in the subtable format, or
    /// the subtable is malformed.
    pub fn map_char(&self, ch: char) -> Result<u16, MapError> {
        match &self.data {
            SubtableData::Deltas(deltas) => deltas.map_char(ch),
            SubtableData::Coverage(coverage) => Ok(coverage.map_char(ch)),
            SubtableData::Unsupported => Ok(0),
        }
    }

    /// Returns all mappings to non-missing glyphs in the ascending char order.
    pub fn mappings(&self) -> Vec<(char, u16)> {
        match &self.data {
            SubtableData::Deltas(deltas) => deltas.mappings(),
            SubtableData::Coverage(coverage) => coverage.mappings(),
            SubtableData::Unsupported => vec![],
        }
    }

    #[cfg(test)]
    pub(crate) fn data(&self) -> &SubtableData {
        &self.data
    }
}

/// Parsed `cmap` table.
#[derive(Debug, Clone)]
pub struct CmapTable {
    subtables: Vec<CmapSubtable>,
}

impl CmapTable {
    pub(crate) fn parse(mut cursor: Cursor<'_>) -> Result<Self, ParseError> {
        let table_cursor = cursor;
        cursor.read_u16_checked(|version| {
            if version != 0 {
                return Err(ParseErrorKind::UnexpectedTableVersion(version.into()));
            }
            Ok(())
        })?;

        let num_tables = cursor.read_u16()?;
        let mut subtables = Vec::with_capacity(num_tables.into());
        for _ in 0..num_tables {
            let platform_id = cursor.read_u16()?;
            let encoding_id = cursor.read_u16()?;
            let offset = cursor.read_u32()? as usize;
            let mut subtable_cursor = table_cursor;
            subtable_cursor.skip(offset)?;
            subtables.push(CmapSubtable::parse(
                CmapId::new(platform_id, encoding_id),
                subtable_cursor,
            )?);
        }
        Ok(Self { subtables })
    }

    /// Returns the number of subtables.
    pub fn num_subtables(&self) -> usize {
        self.subtables.len()
    }

    /// Returns all subtables in the order they are recorded in the table.
    pub fn subtables(&self) -> &[CmapSubtable] {
        &self.subtables
    }

    /// Returns the subtable with the specified ID, if any.
    pub fn subtable(&self, id: CmapId) -> Option<&CmapSubtable> {
        self.subtables.iter().find(|subtable| subtable.id == id)
    }

    /// Returns the preferred Unicode subtable: a full-repertoire one if present, otherwise a BMP one.
    pub fn unicode_subtable(&self) -> Option<&CmapSubtable> {
        let supported = || {
            self.subtables
                .iter()
                .filter(|subtable| subtable.is_supported())
        };
        supported()
            .find(|subtable| subtable.id.is_ucs4())
            .or_else(|| {
                supported().find(|subtable| {
                    subtable.id == CmapId::WINDOWS_BMP || subtable.id == CmapId::UNICODE_BMP
                })
            })
    }

    /// Maps a char to a glyph ID using the [preferred Unicode subtable](Self::unicode_subtable()).
    ///
    /// # Errors
    ///
    /// Returns an error if the char cannot be mapped by the subtable, or the subtable is malformed.
    /// If there is no Unicode subtable, the char is mapped to glyph 0.
    pub fn map_char(&self, ch: char) -> Result<u16, MapError> {
        match self.unicode_subtable() {
            Some(subtable) => subtable.map_char(ch),
            None => Ok(0),
        }
    }
}
