//! OpenType parsing logic.

use core::{fmt, ops, str::FromStr};
use std::{borrow::Cow, collections::BTreeMap};

pub use self::{
    cmap::{CmapId, CmapIdParseError, CmapSubtable, CmapTable},
    eblc::{BitmapSize, EblcTable},
    glyph::{CompositeGlyph, Glyph, GlyphComponent, SimpleGlyph},
    hmtx::HmtxTable,
    loca::{LocaFormat, LocaTable},
    name::{NameRecord, NameTable},
    post::{PostHeader, PostTable, MAC_GLYPH_NAMES},
};
#[cfg(test)]
pub(crate) use self::cmap::SubtableData;
pub(crate) use self::{
    cmap::{SegmentDeltas, SegmentWithDelta, SegmentedCoverage, SequentialMapGroup},
    glyph::{GlyphComponentArgs, TransformData},
};
use crate::errors::{ParseError, ParseErrorKind};

mod cmap;
mod eblc;
mod glyph;
mod hmtx;
mod loca;
mod name;
mod post;

/// Bounds-checked big-endian reader over table data.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cursor<'a> {
    pub(crate) bytes: &'a [u8],
    /// Offset of `bytes` relative to the start of the table (or the font data).
    offset: usize,
    table: Option<TableTag>,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            table: None,
        }
    }

    pub(crate) fn for_table(tag: TableTag, bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            table: Some(tag),
        }
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn err(&self, kind: ParseErrorKind) -> ParseError {
        ParseError {
            kind,
            offset: self.offset,
            table: self.table,
        }
    }

    pub(crate) fn skip(&mut self, len: usize) -> Result<(), ParseError> {
        if self.bytes.len() < len {
            return Err(self.err(ParseErrorKind::UnexpectedEof));
        }
        self.bytes = &self.bytes[len..];
        self.offset += len;
        Ok(())
    }

    /// Splits off the first `len` bytes into a separate cursor, advancing this one.
    pub(crate) fn split_at(&mut self, len: usize) -> Result<Self, ParseError> {
        if self.bytes.len() < len {
            return Err(self.err(ParseErrorKind::UnexpectedEof));
        }
        let (head, tail) = self.bytes.split_at(len);
        let head = Self {
            bytes: head,
            ..*self
        };
        self.bytes = tail;
        self.offset += len;
        Ok(head)
    }

    /// Narrows this cursor to the specified range relative to its current position.
    pub(crate) fn range(&self, range: ops::Range<usize>) -> Result<Self, ParseError> {
        let Some(bytes) = self.bytes.get(range.clone()) else {
            return Err(self.err(ParseErrorKind::RangeOutOfBounds {
                range,
                len: self.bytes.len(),
            }));
        };
        Ok(Self {
            bytes,
            offset: self.offset + range.start,
            table: self.table,
        })
    }

    pub(crate) fn read_byte_array<const N: usize>(&mut self) -> Result<[u8; N], ParseError> {
        let head = self.split_at(N)?;
        // `unwrap()` is safe: the length is checked by `split_at()`
        Ok(head.bytes.try_into().unwrap())
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, ParseError> {
        let [byte] = self.read_byte_array::<1>()?;
        Ok(byte)
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, ParseError> {
        self.read_byte_array().map(u16::from_be_bytes)
    }

    pub(crate) fn read_i16(&mut self) -> Result<i16, ParseError> {
        self.read_byte_array().map(i16::from_be_bytes)
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, ParseError> {
        self.read_byte_array().map(u32::from_be_bytes)
    }

    pub(crate) fn read_u16_checked<T>(
        &mut self,
        check: impl FnOnce(u16) -> Result<T, ParseErrorKind>,
    ) -> Result<T, ParseError> {
        let prev = *self;
        let value = self.read_u16()?;
        check(value).map_err(|kind| prev.err(kind))
    }

    pub(crate) fn read_u32_checked<T>(
        &mut self,
        check: impl FnOnce(u32) -> Result<T, ParseErrorKind>,
    ) -> Result<T, ParseError> {
        let prev = *self;
        let value = self.read_u32()?;
        check(value).map_err(|kind| prev.err(kind))
    }
}

/// 4-byte tag of an OpenType table, e.g. `cmap`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableTag(pub [u8; 4]);

impl fmt::Debug for TableTag {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "TableTag({self})")
    }
}

impl fmt::Display for TableTag {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in &self.0 {
            if byte.is_ascii_graphic() || byte == b' ' {
                write!(formatter, "{}", char::from(byte))?;
            } else {
                write!(formatter, "\\x{byte:02x}")?;
            }
        }
        Ok(())
    }
}

/// Error parsing a [`TableTag`] from a string.
#[derive(Debug)]
#[non_exhaustive]
pub struct TagParseError;

impl fmt::Display for TagParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("table tag must consist of 1 to 4 printable ASCII chars")
    }
}

impl std::error::Error for TagParseError {}

/// Parses a tag from 1 to 4 printable ASCII chars; shorter tags are padded with spaces (e.g., `cvt`).
impl FromStr for TableTag {
    type Err = TagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.is_empty() || bytes.len() > 4 || !bytes.iter().all(|b| b.is_ascii_graphic()) {
            return Err(TagParseError);
        }
        let mut tag = [b' '; 4];
        tag[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(tag))
    }
}

impl TableTag {
    /// Character to glyph mapping.
    pub const CMAP: Self = Self(*b"cmap");
    /// Font header.
    pub const HEAD: Self = Self(*b"head");
    /// Horizontal header.
    pub const HHEA: Self = Self(*b"hhea");
    /// Horizontal metrics.
    pub const HMTX: Self = Self(*b"hmtx");
    /// Maximum profile.
    pub const MAXP: Self = Self(*b"maxp");
    /// Naming table.
    pub const NAME: Self = Self(*b"name");
    /// OS/2 and Windows-specific metrics.
    pub const OS2: Self = Self(*b"OS/2");
    /// PostScript information.
    pub const POST: Self = Self(*b"post");
    /// Index to location.
    pub const LOCA: Self = Self(*b"loca");
    /// Glyph data.
    pub const GLYF: Self = Self(*b"glyf");
    /// Control value table.
    pub const CVT: Self = Self(*b"cvt ");
    /// Font program.
    pub const FPGM: Self = Self(*b"fpgm");
    /// Control value program.
    pub const PREP: Self = Self(*b"prep");
    /// Glyph positioning.
    pub const GPOS: Self = Self(*b"GPOS");
    /// Glyph substitution.
    pub const GSUB: Self = Self(*b"GSUB");
    /// Glyph definition.
    pub const GDEF: Self = Self(*b"GDEF");
    /// Kerning.
    pub const KERN: Self = Self(*b"kern");
    /// Embedded bitmap location data.
    pub const EBLC: Self = Self(*b"EBLC");
    /// Embedded bitmap data.
    pub const EBDT: Self = Self(*b"EBDT");

    /// Tags of the tables holding TrueType hinting programs and data.
    pub const HINTING: [Self; 3] = [Self::FPGM, Self::PREP, Self::CVT];
}

/// Parsed OpenType font: a mapping from table tags to table data.
///
/// Tables of a font read from bytes borrow from these bytes; tables produced by
/// [`Subsetter`](crate::Subsetter) or a [`FontBuilder`] may be owned.
#[derive(Debug, Clone)]
pub struct Font<'a> {
    tables: BTreeMap<TableTag, Cow<'a, [u8]>>,
}

impl<'a> Font<'a> {
    pub(crate) const SFNT_VERSION: u32 = 0x_0001_0000;
    /// Apple's alternative sfnt version for TrueType fonts.
    const SFNT_VERSION_TRUE: u32 = 0x_7472_7565;
    pub(crate) const SFNT_CHECKSUM: u32 = 0x_b1b0_afba;
    pub(crate) const HEAD_CHECKSUM_OFFSET: usize = 8;

    /// Parses a font from the raw sfnt data.
    ///
    /// # Errors
    ///
    /// Returns an error if the table directory is malformed. Table contents are parsed lazily
    /// by the accessor methods.
    pub fn new(bytes: &'a [u8]) -> Result<Self, ParseError> {
        let mut cursor = Cursor::new(bytes);
        cursor.read_u32_checked(|version| {
            if version != Self::SFNT_VERSION && version != Self::SFNT_VERSION_TRUE {
                return Err(ParseErrorKind::UnexpectedFontVersion(version));
            }
            Ok(())
        })?;
        let table_count = cursor.read_u16()?;
        cursor.skip(6)?; // searchRange, entrySelector, rangeShift

        let mut tables = BTreeMap::new();
        for _ in 0..table_count {
            let tag = TableTag(cursor.read_byte_array()?);
            cursor.skip(4)?; // checksum
            let offset = cursor.read_u32()? as usize;
            let len = cursor.read_u32()? as usize;
            let range = offset..offset.saturating_add(len);
            let table_bytes = bytes.get(range.clone()).ok_or_else(|| {
                ParseError {
                    kind: ParseErrorKind::RangeOutOfBounds {
                        range,
                        len: bytes.len(),
                    },
                    offset: 0,
                    table: Some(tag),
                }
            })?;
            tables.insert(tag, Cow::Borrowed(table_bytes));
        }
        Ok(Self { tables })
    }

    /// Iterates over tags of all tables in the font, in the ascending order.
    pub fn table_tags(&self) -> impl ExactSizeIterator<Item = TableTag> + '_ {
        self.tables.keys().copied()
    }

    /// Checks whether this font contains a table with the specified tag.
    pub fn has_table(&self, tag: TableTag) -> bool {
        self.tables.contains_key(&tag)
    }

    /// Returns raw data for the table with the specified tag.
    pub fn table_data(&self, tag: TableTag) -> Option<&[u8]> {
        self.tables.get(&tag).map(AsRef::as_ref)
    }

    pub(crate) fn tables(&self) -> &BTreeMap<TableTag, Cow<'a, [u8]>> {
        &self.tables
    }

    fn expect_table(&self, tag: TableTag) -> Result<Cursor<'_>, ParseError> {
        let bytes = self
            .table_data(tag)
            .ok_or_else(|| ParseError::missing_table(tag))?;
        Ok(Cursor::for_table(tag, bytes))
    }

    /// Computes the OpenType checksum of the data, padding it with zeros to a 4-byte boundary.
    pub(crate) fn checksum(data: &[u8]) -> u32 {
        let mut chunks = data.chunks_exact(4);
        let mut sum = chunks
            .by_ref()
            .map(|chunk| u32::from_be_bytes(chunk.try_into().unwrap()))
            .fold(0_u32, u32::wrapping_add);
        let remainder = chunks.remainder();
        if !remainder.is_empty() {
            let mut last = [0_u8; 4];
            last[..remainder.len()].copy_from_slice(remainder);
            sum = sum.wrapping_add(u32::from_be_bytes(last));
        }
        sum
    }

    /// Returns the number of glyphs as recorded in the `maxp` table.
    ///
    /// # Errors
    ///
    /// Returns an error if the `maxp` table is missing or malformed.
    pub fn num_glyphs(&self) -> Result<u16, ParseError> {
        MaxpTable::parse(self.expect_table(TableTag::MAXP)?).map(|maxp| maxp.num_glyphs)
    }

    /// Parses the `cmap` table.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is missing or malformed.
    pub fn cmap(&self) -> Result<CmapTable, ParseError> {
        CmapTable::parse(self.expect_table(TableTag::CMAP)?)
    }

    /// Parses the `post` table.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is missing or malformed.
    pub fn post(&self) -> Result<PostTable<'_>, ParseError> {
        PostTable::parse(self.expect_table(TableTag::POST)?)
    }

    /// Parses the `hmtx` table. Requires the `hhea` and `maxp` tables as well.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the necessary tables is missing or malformed.
    pub fn hmtx(&self) -> Result<HmtxTable<'_>, ParseError> {
        let hhea = HheaTable::parse(self.expect_table(TableTag::HHEA)?)?;
        let num_glyphs = self.num_glyphs()?;
        HmtxTable::parse(
            self.expect_table(TableTag::HMTX)?,
            hhea.number_of_h_metrics,
            num_glyphs,
        )
    }

    /// Parses the `loca` table. Requires the `head` and `maxp` tables as well.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the necessary tables is missing or malformed.
    pub fn loca(&self) -> Result<LocaTable<'_>, ParseError> {
        let format = HeadTable::parse(self.expect_table(TableTag::HEAD)?)?.loca_format;
        let num_glyphs = self.num_glyphs()?;
        LocaTable::parse(self.expect_table(TableTag::LOCA)?, format, num_glyphs)
    }

    /// Parses a glyph from the `glyf` table.
    ///
    /// # Errors
    ///
    /// Returns an error if `glyph_idx` is out of range, or the `glyf` / `loca` tables
    /// are missing or malformed.
    pub fn glyph(&self, glyph_idx: u16) -> Result<Glyph<'_>, ParseError> {
        let loca = self.loca()?;
        self.glyph_with_loca(&loca, glyph_idx)
    }

    pub(crate) fn glyph_with_loca(
        &self,
        loca: &LocaTable<'_>,
        glyph_idx: u16,
    ) -> Result<Glyph<'_>, ParseError> {
        let range = loca.glyph_range(glyph_idx)?;
        let glyf = self.expect_table(TableTag::GLYF)?;
        Glyph::parse(glyf.range(range)?)
    }

    /// Parses the `name` table.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is missing or malformed.
    pub fn name(&self) -> Result<NameTable<'_>, ParseError> {
        NameTable::parse(self.expect_table(TableTag::NAME)?)
    }

    /// Parses the `EBLC` table.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is missing or malformed.
    pub fn eblc(&self) -> Result<EblcTable, ParseError> {
        EblcTable::parse(self.expect_table(TableTag::EBLC)?)
    }
}

/// Builder assembling a [`Font`] table by table.
#[derive(Debug, Default, Clone)]
pub struct FontBuilder<'a> {
    tables: BTreeMap<TableTag, Cow<'a, [u8]>>,
}

impl<'a> FontBuilder<'a> {
    /// Creates a builder without any tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder initialized with all tables of the provided font.
    pub fn from_font(font: &Font<'a>) -> Self {
        Self {
            tables: font.tables.clone(),
        }
    }

    /// Sets data for the table with the specified tag, replacing the existing table if any.
    pub fn set_table(&mut self, tag: TableTag, data: impl Into<Cow<'a, [u8]>>) -> &mut Self {
        self.tables.insert(tag, data.into());
        self
    }

    /// Removes the table with the specified tag. Does nothing if the table is absent.
    pub fn remove_table(&mut self, tag: TableTag) -> &mut Self {
        self.tables.remove(&tag);
        self
    }

    /// Checks whether the table with the specified tag is set.
    pub fn has_table(&self, tag: TableTag) -> bool {
        self.tables.contains_key(&tag)
    }

    /// Finalizes the font.
    pub fn build(self) -> Font<'a> {
        Font {
            tables: self.tables,
        }
    }
}

/// `head` table fields relevant for subsetting.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HeadTable {
    pub(crate) loca_format: LocaFormat,
}

impl HeadTable {
    pub(crate) const LOCA_FORMAT_OFFSET: usize = 50;

    fn parse(mut cursor: Cursor<'_>) -> Result<Self, ParseError> {
        cursor.read_u32_checked(|version| {
            if version != 0x_0001_0000 {
                return Err(ParseErrorKind::UnexpectedTableVersion(version));
            }
            Ok(())
        })?;
        cursor.skip(Self::LOCA_FORMAT_OFFSET - 4)?;
        // ^ fontRevision, checksumAdjustment, magicNumber, flags, unitsPerEm, created, modified,
        // bounding box, macStyle, lowestRecPPEM, fontDirectionHint

        let loca_format = cursor.read_u16_checked(|raw_format| match raw_format {
            0 => Ok(LocaFormat::Short),
            1 => Ok(LocaFormat::Long),
            _ => Err(ParseErrorKind::UnexpectedLocaFormat(raw_format)),
        })?;
        Ok(Self { loca_format })
    }
}

/// `hhea` table fields relevant for subsetting.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HheaTable {
    pub(crate) number_of_h_metrics: u16,
}

impl HheaTable {
    pub(crate) const EXPECTED_LEN: usize = 36; // 18 words

    fn parse(cursor: Cursor<'_>) -> Result<Self, ParseError> {
        if cursor.bytes.len() != Self::EXPECTED_LEN {
            return Err(cursor.err(ParseErrorKind::UnexpectedTableLen {
                expected: Self::EXPECTED_LEN,
                actual: cursor.bytes.len(),
            }));
        }
        let mut cursor = cursor.range(Self::EXPECTED_LEN - 2..Self::EXPECTED_LEN)?;
        let number_of_h_metrics = cursor.read_u16()?;
        Ok(Self {
            number_of_h_metrics,
        })
    }
}

/// `maxp` table fields relevant for subsetting.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MaxpTable {
    pub(crate) num_glyphs: u16,
}

impl MaxpTable {
    pub(crate) const NUM_GLYPHS_OFFSET: usize = 4;

    fn parse(mut cursor: Cursor<'_>) -> Result<Self, ParseError> {
        cursor.read_u32_checked(|version| {
            if version != 0x_0000_5000 && version != 0x_0001_0000 {
                return Err(ParseErrorKind::UnexpectedTableVersion(version));
            }
            Ok(())
        })?;
        let num_glyphs = cursor.read_u16()?;
        Ok(Self { num_glyphs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsing_table_tags() {
        assert_eq!("cmap".parse::<TableTag>().unwrap(), TableTag::CMAP);
        assert_eq!("cvt".parse::<TableTag>().unwrap(), TableTag::CVT);
        assert_eq!("OS/2".parse::<TableTag>().unwrap(), TableTag::OS2);
        assert!("".parse::<TableTag>().is_err());
        assert!("glyphs".parse::<TableTag>().is_err());
        assert!("a b".parse::<TableTag>().is_err());

        assert_eq!(TableTag::CVT.to_string(), "cvt ");
        assert_eq!(TableTag([0, b'a', b'b', b'c']).to_string(), "\\x00abc");
    }

    #[test]
    fn cursor_reports_offsets() {
        let bytes = [0_u8, 1, 2, 3, 4];
        let mut cursor = Cursor::for_table(TableTag::HEAD, &bytes);
        assert_eq!(cursor.read_u16().unwrap(), 1);
        assert_eq!(cursor.read_u16().unwrap(), 0x0203);
        let err = cursor.read_u16().unwrap_err();
        assert!(matches!(err.kind(), ParseErrorKind::UnexpectedEof));
        assert_eq!(err.offset(), 4);
        assert_eq!(err.table(), Some(TableTag::HEAD));

        let err = cursor.range(0..3).unwrap_err();
        assert!(matches!(
            err.kind(),
            ParseErrorKind::RangeOutOfBounds { len: 1, .. }
        ));
    }

    #[test]
    fn checksum_pads_data() {
        assert_eq!(Font::checksum(&[]), 0);
        assert_eq!(Font::checksum(&[0, 0, 0, 1, 0, 0, 0, 2]), 3);
        assert_eq!(Font::checksum(&[0, 0, 0, 1, 1]), 0x_0100_0001);
        assert_eq!(Font::checksum(&[0xff; 8]), 0x_ffff_fffe);
    }

    #[test]
    fn font_with_invalid_version() {
        let err = Font::new(&[0, 0, 0, 0, 0, 0]).unwrap_err();
        assert!(matches!(err.kind(), ParseErrorKind::UnexpectedFontVersion(0)));
    }

    #[test]
    fn missing_tables_are_reported() {
        let font = FontBuilder::new().build();
        let err = font.num_glyphs().unwrap_err();
        assert!(matches!(err.kind(), ParseErrorKind::MissingTable));
        assert_eq!(err.table(), Some(TableTag::MAXP));

        let err = font.glyph(0).unwrap_err();
        assert_eq!(err.table(), Some(TableTag::HEAD));
    }
}
