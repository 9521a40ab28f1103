//! `cmap` table building.

use core::mem;
use std::collections::BTreeMap;

use super::{write_u16, write_u32};
use crate::font::{
    CmapId, SegmentDeltas, SegmentWithDelta, SegmentedCoverage, SequentialMapGroup,
};

/// Builder of the `cmap` table.
///
/// Subtables with [UCS-4 IDs](CmapId::is_ucs4()) are encoded in format 12 (segmented coverage);
/// all other subtables are encoded in format 4 (segment mapping to delta values), which can
/// only represent chars from the Basic Multilingual Plane. Chars outside the BMP
/// are skipped for format 4 subtables.
///
/// # Examples
///
/// ```
/// # use std::collections::BTreeMap;
/// # use sfnt_subset::{CmapId, CmapTableBuilder, FontBuilder, TableTag};
/// let mapping = BTreeMap::from([('A', 1), ('B', 2), ('z', 3)]);
/// let cmap = CmapTableBuilder::new(mapping).build();
///
/// let mut font = FontBuilder::new();
/// font.set_table(TableTag::CMAP, cmap);
/// let cmap = font.build().cmap()?;
/// assert_eq!(cmap.num_subtables(), 1);
/// let subtable = cmap.subtable(CmapId::WINDOWS_BMP).unwrap();
/// assert_eq!(subtable.format(), 4);
/// assert_eq!(subtable.map_char('B')?, 2);
/// assert_eq!(subtable.map_char('C')?, 0);
/// # Ok::<_, Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct CmapTableBuilder {
    subtables: BTreeMap<CmapId, BTreeMap<char, u16>>,
}

impl CmapTableBuilder {
    /// Byte length of the table header (version and the number of subtables).
    const HEADER_LEN: usize = 4;
    const RECORD_LEN: usize = 8;

    /// Creates a builder with a single Windows BMP subtable (platform 3, encoding 1)
    /// containing the provided mapping.
    pub fn new(mapping: impl IntoIterator<Item = (char, u16)>) -> Self {
        let mut this = Self::empty();
        this.subtable(CmapId::WINDOWS_BMP, mapping);
        this
    }

    /// Creates a builder without subtables.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds a subtable with the specified ID, replacing the existing subtable with the same ID.
    /// Mappings to glyph 0 (the missing glyph) are skipped since they are implied.
    pub fn subtable(
        &mut self,
        id: CmapId,
        mapping: impl IntoIterator<Item = (char, u16)>,
    ) -> &mut Self {
        let mapping = mapping
            .into_iter()
            .filter(|&(_, glyph_id)| glyph_id != 0)
            .collect();
        self.subtables.insert(id, mapping);
        self
    }

    /// Returns IDs of the subtables added to this builder, in the ascending order.
    pub fn subtable_ids(&self) -> impl ExactSizeIterator<Item = CmapId> + '_ {
        self.subtables.keys().copied()
    }

    /// Writes the table. Subtables are ordered by the platform ID, then by the encoding ID.
    /// Subtables with the same content share the data.
    pub fn build(&self) -> Vec<u8> {
        let mut encoded_subtables: Vec<Vec<u8>> = vec![];
        let mut subtable_indices = Vec::with_capacity(self.subtables.len());
        for (&id, mapping) in &self.subtables {
            let mut buffer = vec![];
            if id.is_ucs4() {
                SegmentedCoverage::from_map(mapping).write(&mut buffer);
            } else {
                SegmentDeltas::from_map(mapping).write(&mut buffer);
            }

            let idx = encoded_subtables
                .iter()
                .position(|existing| *existing == buffer)
                .unwrap_or_else(|| {
                    encoded_subtables.push(buffer);
                    encoded_subtables.len() - 1
                });
            subtable_indices.push(idx);
        }

        let mut offsets = Vec::with_capacity(encoded_subtables.len());
        let mut offset = Self::HEADER_LEN + Self::RECORD_LEN * self.subtables.len();
        for subtable in &encoded_subtables {
            offsets.push(offset);
            offset += subtable.len();
        }

        let mut buffer = Vec::with_capacity(offset);
        write_u16(&mut buffer, 0); // version
        // Realistically, there is only a handful of subtables
        write_u16(
            &mut buffer,
            u16::try_from(self.subtables.len()).unwrap_or(u16::MAX),
        );
        for (id, idx) in self.subtables.keys().zip(subtable_indices) {
            write_u16(&mut buffer, id.platform_id);
            write_u16(&mut buffer, id.encoding_id);
            write_u32(
                &mut buffer,
                u32::try_from(offsets[idx]).expect("cmap subtable offset overflow"),
            );
        }
        for subtable in encoded_subtables {
            buffer.extend(subtable);
        }
        buffer
    }
}

/// Maximal run of consecutive chars.
#[derive(Debug)]
struct CharRun {
    start_code: u16,
    glyph_ids: Vec<u16>,
}

impl CharRun {
    #[allow(clippy::cast_possible_truncation)] // runs are limited to the BMP
    fn end_code(&self) -> u16 {
        self.start_code + (self.glyph_ids.len() - 1) as u16
    }

    /// Splits the run into maximal sub-runs with consecutive glyph IDs.
    #[allow(clippy::cast_possible_truncation)] // runs are limited to the BMP
    fn delta_segments(&self) -> impl Iterator<Item = SegmentWithDelta> + '_ {
        let mut start = 0;
        (1..=self.glyph_ids.len()).filter_map(move |end| {
            let is_break = self.glyph_ids.get(end).is_none_or(|&glyph_id| {
                glyph_id != self.glyph_ids[end - 1].wrapping_add(1)
            });
            if !is_break {
                return None;
            }
            // Computed without going past the run end, which may be U+FFFF
            let start_code = self.start_code + start as u16;
            let segment = SegmentWithDelta {
                start_code,
                end_code: start_code + (end - start - 1) as u16,
                id_delta: self.glyph_ids[start].wrapping_sub(start_code),
                id_range_offset: 0,
            };
            start = end;
            Some(segment)
        })
    }

    /// Checks whether encoding the run with `glyphIdArray` is more compact than with deltas.
    /// Each segment takes 8 bytes; a glyph ID array entry takes 2 bytes.
    fn prefers_glyph_array(&self) -> bool {
        8 + 2 * self.glyph_ids.len() < 8 * self.delta_segments().count()
    }
}

impl SegmentDeltas {
    fn char_runs(mapping: &BTreeMap<char, u16>) -> Vec<CharRun> {
        let mut runs: Vec<CharRun> = vec![];
        for (&ch, &glyph_id) in mapping {
            let Ok(code) = u16::try_from(u32::from(ch)) else {
                break; // all remaining chars are outside the BMP as well
            };
            match runs.last_mut() {
                Some(run) if run.end_code().checked_add(1) == Some(code) => {
                    run.glyph_ids.push(glyph_id);
                }
                _ => runs.push(CharRun {
                    start_code: code,
                    glyph_ids: vec![glyph_id],
                }),
            }
        }
        runs
    }

    pub(crate) fn from_map(mapping: &BTreeMap<char, u16>) -> Self {
        let runs = Self::char_runs(mapping);
        let encoded_chars = runs.iter().map(|run| run.glyph_ids.len()).sum::<usize>();
        let skipped_chars = mapping.len() - encoded_chars;
        if skipped_chars > 0 {
            log::debug!("skipped {skipped_chars} non-BMP chars for a format 4 `cmap` subtable");
        }

        let deltas = Self::from_runs(&runs, true);
        if deltas.glyph_id_array_fits() {
            deltas
        } else {
            log::debug!("glyph ID array is too large; encoding `cmap` subtable with deltas only");
            Self::from_runs(&runs, false)
        }
    }

    fn from_runs(runs: &[CharRun], allow_glyph_array: bool) -> Self {
        // `(segment, start index in glyphIdArray)` pairs; the index is set for array segments only
        let mut segments: Vec<(SegmentWithDelta, Option<usize>)> = vec![];
        let mut glyph_id_array = vec![];
        for run in runs {
            if allow_glyph_array && run.prefers_glyph_array() {
                let segment = SegmentWithDelta {
                    start_code: run.start_code,
                    end_code: run.end_code(),
                    id_delta: 0,
                    id_range_offset: 0, // set below, once the number of segments is known
                };
                segments.push((segment, Some(glyph_id_array.len())));
                glyph_id_array.extend_from_slice(&run.glyph_ids);
            } else {
                segments.extend(run.delta_segments().map(|segment| (segment, None)));
            }
        }

        let ends_at_last_char = segments
            .last()
            .is_some_and(|(segment, _)| segment.end_code == u16::MAX);
        if !ends_at_last_char {
            segments.push((
                SegmentWithDelta {
                    start_code: u16::MAX,
                    end_code: u16::MAX,
                    id_delta: 1, // maps `0xffff` to glyph 0
                    id_range_offset: 0,
                },
                None,
            ));
        }

        let segment_count = segments.len();
        let segments = segments.into_iter().enumerate();
        let segments = segments.map(|(i, (mut segment, array_start))| {
            if let Some(array_start) = array_start {
                // The offset is in bytes from the `idRangeOffset` entry of the segment
                let offset = 2 * (segment_count - i + array_start);
                segment.id_range_offset = u16::try_from(offset).unwrap_or(u16::MAX);
            }
            segment
        });
        Self {
            segments: segments.collect(),
            glyph_id_array,
        }
    }

    fn glyph_id_array_fits(&self) -> bool {
        2 * (self.segments.len() + self.glyph_id_array.len()) <= usize::from(u16::MAX)
    }

    fn subtable_len(&self) -> usize {
        16 + 8 * self.segments.len() + 2 * self.glyph_id_array.len()
    }

    pub(crate) fn write(&self, writer: &mut Vec<u8>) {
        write_u16(writer, Self::FORMAT);
        let subtable_len = self.subtable_len();
        let subtable_len = u16::try_from(subtable_len).unwrap_or_else(|_| {
            log::warn!(
                "format 4 `cmap` subtable length ({subtable_len}) does not fit into u16; saturating"
            );
            u16::MAX
        });
        write_u16(writer, subtable_len);
        write_u16(writer, 0); // language

        // There is always at least one segment, the terminal one or the one covering U+FFFF.
        // Deltas-only encoding of a densely mapped BMP may need up to 1 segment per char.
        let segment_count = self.segments.len();
        let segment_count = u16::try_from(segment_count)
            .ok()
            .filter(|&count| count <= u16::MAX / 2)
            .unwrap_or_else(|| {
                log::warn!(
                    "number of format 4 `cmap` segments ({segment_count}) does not fit into u16 \
                     when doubled; saturating"
                );
                u16::MAX / 2
            });
        let seg_count_x2 = 2 * segment_count;
        write_u16(writer, seg_count_x2);
        #[allow(clippy::cast_possible_truncation)] // `ilog2()` of u16 is < 16
        let entry_selector = segment_count.ilog2() as u16;
        let search_range = 1_u16 << (entry_selector + 1);
        write_u16(writer, search_range);
        write_u16(writer, entry_selector);
        write_u16(writer, seg_count_x2 - search_range);

        for segment in &self.segments {
            write_u16(writer, segment.end_code);
        }
        write_u16(writer, 0); // reserved padding
        for segment in &self.segments {
            write_u16(writer, segment.start_code);
        }
        for segment in &self.segments {
            write_u16(writer, segment.id_delta);
        }
        for segment in &self.segments {
            write_u16(writer, segment.id_range_offset);
        }
        for &glyph_id in &self.glyph_id_array {
            write_u16(writer, glyph_id);
        }
    }
}

impl SegmentedCoverage {
    pub(crate) fn from_map(mapping: &BTreeMap<char, u16>) -> Self {
        let mut groups = vec![];
        let mut mapping = mapping.iter();
        let Some((&first_char, &first_idx)) = mapping.next() else {
            return Self::default();
        };
        let mut current_group = SequentialMapGroup {
            start_char_code: first_char.into(),
            end_char_code: first_char.into(),
            start_glyph_id: first_idx.into(),
        };

        for (&ch, &glyph_idx) in mapping {
            if u32::from(ch) == current_group.end_char_code + 1
                && u32::from(glyph_idx) == current_group.map_unchecked(ch)
            {
                current_group.end_char_code += 1;
            } else {
                let prev_group = mem::replace(
                    &mut current_group,
                    SequentialMapGroup {
                        start_char_code: ch.into(),
                        end_char_code: ch.into(),
                        start_glyph_id: glyph_idx.into(),
                    },
                );
                groups.push(prev_group);
            }
        }

        groups.push(current_group);
        Self { groups }
    }

    fn subtable_len(&self) -> usize {
        16 + 12 * self.groups.len()
    }

    pub(crate) fn write(&self, writer: &mut Vec<u8>) {
        write_u16(writer, Self::FORMAT);
        write_u16(writer, 0); // reserved

        // Cannot overflow: there are at most 0x110000 groups
        #[allow(clippy::cast_possible_truncation)]
        write_u32(writer, self.subtable_len() as u32);
        write_u32(writer, 0); // language
        #[allow(clippy::cast_possible_truncation)]
        write_u32(writer, self.groups.len() as u32);
        for group in &self.groups {
            write_u32(writer, group.start_char_code);
            write_u32(writer, group.end_char_code);
            write_u32(writer, group.start_glyph_id);
        }
    }
}
