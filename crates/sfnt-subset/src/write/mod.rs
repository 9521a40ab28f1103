//! Logic for building OpenType tables and serializing [`Font`]s.

use core::iter;

pub use self::{
    cmap::CmapTableBuilder,
    hmtx::{HmtxTableBuilder, HorizontalMetric},
    post::PostTableBuilder,
};
use crate::{
    font::{Glyph, GlyphComponent, GlyphComponentArgs, LocaFormat, TransformData},
    Font, TableTag,
};

mod brotli;
mod cmap;
mod hmtx;
mod post;

pub(crate) fn write_u16(writer: &mut Vec<u8>, value: u16) {
    writer.extend_from_slice(&value.to_be_bytes());
}

pub(crate) fn write_u32(writer: &mut Vec<u8>, value: u32) {
    writer.extend_from_slice(&value.to_be_bytes());
}

fn pad_to_even(writer: &mut Vec<u8>, start: usize) {
    if (writer.len() - start) % 2 != 0 {
        writer.push(0);
    }
}

fn uint_base128_len(val: u32) -> usize {
    if val == 0 {
        1
    } else {
        val.ilog2() as usize / 7 + 1
    }
}

#[allow(clippy::cast_possible_truncation)] // intentional
fn write_uint_base128(buffer: &mut Vec<u8>, val: u32) {
    if val >= 1 << 28 {
        buffer.push(0x80 | (val >> 28) as u8);
    }
    if val >= 1 << 21 {
        buffer.push(0x80 | (val >> 21) as u8);
    }
    if val >= 1 << 14 {
        buffer.push(0x80 | (val >> 14) as u8);
    }
    if val >= 1 << 7 {
        buffer.push(0x80 | (val >> 7) as u8);
    }
    buffer.push((val & 127) as u8);
}

impl Font<'_> {
    /// Serializes this font in the OpenType (`.ttf`) format. Table records are sorted by tag,
    /// table data is 4-byte aligned, and checksums (including `checksumAdjustment` in the `head` table)
    /// are computed.
    pub fn to_truetype(&self) -> Vec<u8> {
        FontWriter::new(self).into_opentype()
    }

    /// Serializes this font in the WOFF2 format. No table transforms are applied.
    pub fn to_woff2(&self) -> Vec<u8> {
        FontWriter::new(self).into_woff2()
    }
}

pub(crate) fn write_loca_table(locations: &[usize], writer: &mut Vec<u8>) -> LocaFormat {
    let all_even = locations.iter().all(|&loc| loc % 2 == 0);
    let in_bounds = locations
        .last()
        .is_none_or(|&loc| loc <= usize::from(u16::MAX) * 2);
    if all_even && in_bounds {
        for &loc in locations {
            #[allow(clippy::cast_possible_truncation)]
            // doesn't happen due to the preceding check
            write_u16(writer, (loc / 2) as u16);
        }
        LocaFormat::Short
    } else {
        for &loc in locations {
            write_u32(writer, u32::try_from(loc).expect("glyph location overflow"));
        }
        LocaFormat::Long
    }
}

impl Glyph<'_> {
    /// Writes this glyph with component references remapped via `map_glyph`. If `strip_hints` is set,
    /// hinting instructions are removed, and the glyph data is padded to an even length.
    pub(crate) fn write(
        &self,
        writer: &mut Vec<u8>,
        strip_hints: bool,
        map_glyph: impl Fn(u16) -> u16,
    ) {
        let start = writer.len();
        match self {
            Self::Empty => { /* do nothing */ }
            Self::Simple(glyph) => {
                if strip_hints {
                    let (head, tail) = glyph.split_around_instructions();
                    writer.extend_from_slice(head);
                    write_u16(writer, 0); // instructionLength
                    writer.extend_from_slice(tail);
                    pad_to_even(writer, start);
                } else {
                    writer.extend_from_slice(glyph.raw);
                }
            }
            Self::Composite(glyph) => {
                write_u16(writer, u16::MAX); // numberOfContours = -1
                writer.extend_from_slice(&glyph.header);
                let mut has_instructions = false;
                for component in &glyph.components {
                    let mut flags = component.flags;
                    if strip_hints {
                        flags &= !GlyphComponent::WE_HAVE_INSTRUCTIONS;
                    }
                    has_instructions |= flags & GlyphComponent::WE_HAVE_INSTRUCTIONS != 0;
                    component.write(writer, flags, map_glyph(component.glyph_idx));
                }

                if has_instructions {
                    // Cannot overflow: the length was read from a u16 field
                    let len = u16::try_from(glyph.instructions.len()).unwrap_or(u16::MAX);
                    write_u16(writer, len);
                    writer.extend_from_slice(glyph.instructions);
                }
                if strip_hints {
                    pad_to_even(writer, start);
                } else {
                    writer.extend(iter::repeat_n(0_u8, glyph.padding));
                }
            }
        }
    }
}

impl GlyphComponent {
    fn write(&self, writer: &mut Vec<u8>, flags: u16, glyph_idx: u16) {
        write_u16(writer, flags);
        write_u16(writer, glyph_idx);
        match self.args {
            GlyphComponentArgs::U16(args) => write_u16(writer, args),
            GlyphComponentArgs::U32(args) => write_u32(writer, args),
        }
        match self.transform {
            TransformData::None => { /* do nothing */ }
            TransformData::Scale(val) => write_u16(writer, val),
            TransformData::TwoScales([x, y]) => {
                write_u16(writer, x);
                write_u16(writer, y);
            }
            TransformData::Affine([xx, xy, yx, yy]) => {
                write_u16(writer, xx);
                write_u16(writer, xy);
                write_u16(writer, yx);
                write_u16(writer, yy);
            }
        }
    }
}

/// Tags with a dedicated index in the WOFF2 table directory.
const WOFF2_KNOWN_TAGS: [[u8; 4]; 63] = [
    *b"cmap", *b"head", *b"hhea", *b"hmtx", *b"maxp", *b"name", *b"OS/2", *b"post",
    *b"cvt ", *b"fpgm", *b"glyf", *b"loca", *b"prep", *b"CFF ", *b"VORG", *b"EBDT",
    *b"EBLC", *b"gasp", *b"hdmx", *b"kern", *b"LTSH", *b"PCLT", *b"VDMX", *b"vhea",
    *b"vmtx", *b"BASE", *b"GDEF", *b"GPOS", *b"GSUB", *b"EBSC", *b"JSTF", *b"MATH",
    *b"CBDT", *b"CBLC", *b"COLR", *b"CPAL", *b"SVG ", *b"sbix", *b"acnt", *b"avar",
    *b"bdat", *b"bloc", *b"bsln", *b"cvar", *b"fdsc", *b"feat", *b"fmtx", *b"fvar",
    *b"gvar", *b"hsty", *b"just", *b"lcar", *b"mort", *b"morx", *b"opbd", *b"prop",
    *b"trak", *b"Zapf", *b"Silf", *b"Glat", *b"Gloc", *b"Feat", *b"Sill",
];

#[derive(Debug, Clone, Copy)]
#[cfg_attr(test, derive(PartialEq))]
struct TableRecord {
    tag: TableTag,
    checksum: u32,
    /// Offset is initially recorded relative to the table data start. It's always 4-byte aligned.
    offset: u32,
    length: u32,
}

impl TableRecord {
    const BYTE_LEN: usize = 16;
    const WOFF2_ARBITRARY_TAG: u8 = 63;

    fn write_opentype(&self, writer: &mut Vec<u8>) {
        writer.extend_from_slice(&self.tag.0);
        write_u32(writer, self.checksum);
        write_u32(writer, self.offset);
        write_u32(writer, self.length);
    }

    fn self_checksum(&self) -> u32 {
        u32::from_be_bytes(self.tag.0)
            .wrapping_add(self.checksum)
            .wrapping_add(self.offset)
            .wrapping_add(self.length)
    }

    fn woff2_tag_index(&self) -> Option<u8> {
        let idx = WOFF2_KNOWN_TAGS.iter().position(|tag| *tag == self.tag.0)?;
        u8::try_from(idx).ok()
    }

    fn woff2_len(&self) -> usize {
        let tag_len = if self.woff2_tag_index().is_some() { 0 } else { 4 };
        1 /* flags */ + tag_len + uint_base128_len(self.length)
    }

    fn write_woff2(&self, buffer: &mut Vec<u8>) {
        /// Transform version 3, which is the null transform for `glyf` and `loca` tables.
        const NULL_TRANSFORM: u8 = 0b_1100_0000;

        if let Some(idx) = self.woff2_tag_index() {
            let flags = match self.tag {
                TableTag::GLYF | TableTag::LOCA => idx | NULL_TRANSFORM,
                _ => idx,
            };
            buffer.push(flags);
        } else {
            buffer.push(Self::WOFF2_ARBITRARY_TAG);
            buffer.extend_from_slice(&self.tag.0);
        }
        write_uint_base128(buffer, self.length);
    }
}

#[derive(Debug, Clone, Default)]
struct FontWriter {
    tables: Vec<TableRecord>,
    /// Contains *aligned* table data
    table_data: Vec<u8>,
}

impl FontWriter {
    const SFNT_HEADER_LEN: usize = 12;
    const WOFF2_HEADER_LEN: usize = 48;

    /// Writes all tables of the font. Tables are written in the tag order, except for `loca`,
    /// which immediately follows `glyf` (as required by WOFF2).
    fn new(font: &Font<'_>) -> Self {
        let tables = font.tables();
        let moves_loca = tables.contains_key(&TableTag::GLYF);

        let mut this = Self::default();
        for (&tag, data) in tables {
            match tag {
                TableTag::LOCA if moves_loca => continue,
                TableTag::HEAD => {
                    this.write_table(tag, |buffer| Self::write_head_table(data, buffer));
                }
                _ => this.write_raw_table(tag, data),
            }
            if tag == TableTag::GLYF {
                if let Some(loca) = tables.get(&TableTag::LOCA) {
                    this.write_raw_table(TableTag::LOCA, loca);
                }
            }
        }
        this
    }

    fn write_head_table(original: &[u8], writer: &mut Vec<u8>) {
        let checksum_range = Font::HEAD_CHECKSUM_OFFSET..Font::HEAD_CHECKSUM_OFFSET + 4;
        let start = writer.len();
        writer.extend_from_slice(original);
        if let Some(checksum) = writer[start..].get_mut(checksum_range) {
            // Zero the checksum; it is adjusted once all tables are written
            checksum.fill(0);
        }
    }

    fn write_table<T>(&mut self, tag: TableTag, with: impl FnOnce(&mut Vec<u8>) -> T) -> T {
        let offset = self.table_data.len();
        debug_assert_eq!(offset % 4, 0, "unaligned offset: {offset}");

        let output = with(&mut self.table_data);
        let length = self.table_data.len() - offset;
        // Pad the table heap to a 4-byte boundary.
        if length % 4 > 0 {
            let zero_padding = 4 - length % 4;
            self.table_data.extend(iter::repeat_n(0_u8, zero_padding));
        }

        let checksum = Font::checksum(&self.table_data[offset..]);
        self.tables.push(TableRecord {
            tag,
            checksum,
            offset: u32::try_from(offset).expect("table offset overflow"),
            length: u32::try_from(length).expect("table length overflow"),
        });
        output
    }

    fn write_raw_table(&mut self, tag: TableTag, content: &[u8]) {
        self.write_table(tag, |buffer| buffer.extend_from_slice(content));
    }

    fn write_sfnt_header(&self) -> Vec<u8> {
        let mut buffer = vec![];
        write_u32(&mut buffer, Font::SFNT_VERSION);

        let table_count = u16::try_from(self.tables.len()).expect("too many tables");
        write_u16(&mut buffer, table_count);
        let (search_range, entry_selector) = if table_count == 0 {
            (0, 0)
        } else {
            // `unwrap()` is safe: `ilog2()` of u16 is less than 16
            let entry_selector = u16::try_from(table_count.ilog2()).unwrap();
            (16_u16 << entry_selector, entry_selector)
        };
        write_u16(&mut buffer, search_range);
        write_u16(&mut buffer, entry_selector);
        let range_shift = table_count.wrapping_mul(16).wrapping_sub(search_range);
        write_u16(&mut buffer, range_shift);

        debug_assert_eq!(buffer.len(), Self::SFNT_HEADER_LEN);
        buffer
    }

    /// Returns the starting offset of table data.
    fn data_offset(&self) -> usize {
        Self::SFNT_HEADER_LEN + self.tables.len() * TableRecord::BYTE_LEN
    }

    fn into_opentype(mut self) -> Vec<u8> {
        let mut buffer = self.write_sfnt_header();
        self.adjust_data(Font::checksum(&buffer));

        self.tables.sort_unstable_by_key(|record| record.tag.0);
        for record in &self.tables {
            record.write_opentype(&mut buffer);
        }
        buffer.extend(self.table_data);
        buffer
    }

    fn adjust_data(&mut self, sfnt_header_checksum: u32) {
        let data_offset = self.data_offset();
        let data_offset_u32 = u32::try_from(data_offset).expect("data_offset overflow");

        let mut file_checksum = sfnt_header_checksum;
        for record in &mut self.tables {
            record.offset += data_offset_u32;
            file_checksum = file_checksum
                .wrapping_add(record.self_checksum())
                .wrapping_add(record.checksum);
        }
        self.patch_head_table(file_checksum, data_offset);
    }

    fn patch_head_table(&mut self, file_checksum: u32, data_offset: usize) {
        let Some(head) = self.tables.iter().find(|record| record.tag == TableTag::HEAD) else {
            log::warn!("font has no `head` table; checksum adjustment is skipped");
            return;
        };
        if (head.length as usize) < Font::HEAD_CHECKSUM_OFFSET + 4 {
            log::warn!("`head` table is too short; checksum adjustment is skipped");
            return;
        }

        let checksum_adjustment = Font::SFNT_CHECKSUM.wrapping_sub(file_checksum);
        // At this point, the table offset already includes the heap offset, so we need to subtract it.
        let offset = head.offset as usize + Font::HEAD_CHECKSUM_OFFSET - data_offset;
        self.table_data[offset..offset + 4].copy_from_slice(&checksum_adjustment.to_be_bytes());
    }

    fn into_woff2(mut self) -> Vec<u8> {
        const WOFF2_SIGNATURE: u32 = 0x_774f_4632;

        self.adjust_data(Font::checksum(&self.write_sfnt_header()));

        let compressed_data = self.compress_data();
        let tables_len = self
            .tables
            .iter()
            .map(TableRecord::woff2_len)
            .sum::<usize>();
        let mut file_len = Self::WOFF2_HEADER_LEN + tables_len + compressed_data.len();
        if file_len % 4 != 0 {
            file_len += 4 - file_len % 4;
        }

        let mut buffer = Vec::with_capacity(file_len);
        write_u32(&mut buffer, WOFF2_SIGNATURE);
        write_u32(&mut buffer, Font::SFNT_VERSION);
        write_u32(
            &mut buffer,
            file_len.try_into().expect("file length overflow"),
        );
        // `unwrap()` is safe: the table count is checked when writing the sfnt header
        write_u16(&mut buffer, self.tables.len().try_into().unwrap());
        write_u16(&mut buffer, 0); // reserved

        let decompressed_len = self.data_offset() + self.table_data.len();
        write_u32(
            &mut buffer,
            decompressed_len.try_into().expect("font length overflow"),
        );
        // `unwrap` is safe, since `file_len` fits into u32.
        write_u32(&mut buffer, compressed_data.len().try_into().unwrap());
        write_u32(&mut buffer, 0); // WOFF version
        write_u32(&mut buffer, 0); // metadata offset
        write_u32(&mut buffer, 0); // metadata length
        write_u32(&mut buffer, 0); // original metadata length
        write_u32(&mut buffer, 0); // private block offset
        write_u32(&mut buffer, 0); // private block length
        debug_assert_eq!(buffer.len(), Self::WOFF2_HEADER_LEN);

        for record in &self.tables {
            record.write_woff2(&mut buffer);
        }
        debug_assert_eq!(buffer.len(), Self::WOFF2_HEADER_LEN + tables_len);
        buffer.extend(compressed_data);

        // Pad `buffer` to be 4-byte aligned. This is required even though we don't have metadata or private blocks.
        if buffer.len() % 4 != 0 {
            let padding = 4 - buffer.len() % 4;
            buffer.extend(iter::repeat_n(0, padding));
        }
        debug_assert_eq!(file_len, buffer.len());
        buffer
    }
}
