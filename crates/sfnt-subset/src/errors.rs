use core::{fmt, ops};

use crate::TableTag;

/// Kind of a font [`ParseError`].
#[derive(Debug)]
#[non_exhaustive]
pub enum ParseErrorKind {
    /// Unexpected end of the font data.
    UnexpectedEof,
    /// Unexpected font version.
    UnexpectedFontVersion(u32),
    /// Missing required font table (e.g., `head`).
    MissingTable,
    /// Offset inferred from the table data is out of bounds.
    OffsetOutOfBounds(usize),
    /// Range inferred from the table data is out of bounds.
    RangeOutOfBounds {
        /// Inferred range.
        range: ops::Range<usize>,
        /// Length of the indexed data.
        len: usize,
    },
    /// Unexpected table version.
    UnexpectedTableVersion(u32),
    /// Unexpected table length.
    UnexpectedTableLen {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },
    /// Unexpected table format (e.g., for a `cmap` subtable).
    UnexpectedTableFormat(u16),
    /// Unexpected `indexToLocFormat` value in the `head` table.
    UnexpectedLocaFormat(u16),
    /// Glyph index is not covered by the font.
    GlyphOutOfRange {
        /// Requested glyph index.
        glyph_idx: u16,
        /// Number of glyphs in the font.
        glyph_count: u16,
    },
    /// Glyph name in the `post` table is not valid ASCII.
    InvalidGlyphName,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof => formatter.write_str("unexpected end of the font data"),
            Self::UnexpectedFontVersion(val) => {
                write!(formatter, "unexpected font version ({val:#010x})")
            }
            Self::MissingTable => formatter.write_str("missing required font table"),
            Self::OffsetOutOfBounds(val) => {
                write!(
                    formatter,
                    "offset ({val}) inferred from the table data is out of bounds"
                )
            }
            Self::RangeOutOfBounds { range, len } => {
                write!(
                    formatter,
                    "range ({range:?}) inferred from the table data is out of bounds (..{len})"
                )
            }
            Self::UnexpectedTableVersion(val) => {
                write!(formatter, "unexpected table version ({val:#x})")
            }
            Self::UnexpectedTableLen { expected, actual } => {
                write!(
                    formatter,
                    "unexpected table length: expected {expected}, got {actual}"
                )
            }
            Self::UnexpectedTableFormat(val) => {
                write!(formatter, "unexpected table format ({val})")
            }
            Self::UnexpectedLocaFormat(val) => {
                write!(formatter, "unexpected `loca` table format ({val})")
            }
            Self::GlyphOutOfRange {
                glyph_idx,
                glyph_count,
            } => {
                write!(
                    formatter,
                    "glyph #{glyph_idx} is out of range (the font has {glyph_count} glyphs)"
                )
            }
            Self::InvalidGlyphName => formatter.write_str("glyph name is not valid ASCII"),
        }
    }
}

impl std::error::Error for ParseErrorKind {}

/// Errors that can occur when parsing an OpenType [`Font`](crate::Font).
#[derive(Debug)]
pub struct ParseError {
    pub(crate) kind: ParseErrorKind,
    pub(crate) offset: usize,
    pub(crate) table: Option<TableTag>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(table) = self.table {
            write!(formatter, "[{table}] ")?;
        }
        if self.offset > 0 {
            write!(formatter, "{}: ", self.offset)?;
        }
        fmt::Display::fmt(&self.kind, formatter)
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl ParseError {
    pub(crate) fn missing_table(tag: TableTag) -> Self {
        Self {
            kind: ParseErrorKind::MissingTable,
            offset: 0,
            table: Some(tag),
        }
    }

    pub(crate) fn glyph_out_of_range(glyph_idx: u16, glyph_count: u16) -> Self {
        Self {
            kind: ParseErrorKind::GlyphOutOfRange {
                glyph_idx,
                glyph_count,
            },
            offset: 0,
            table: None,
        }
    }

    /// Gets the error kind.
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }

    /// Gets the table this error relates to.
    pub fn table(&self) -> Option<TableTag> {
        self.table
    }

    /// Gets the offset in the table data (or in the font data if [`Self::table()`] is `None`).
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// Errors that can occur when mapping a char to a glyph using a `cmap` subtable.
#[derive(Debug)]
#[non_exhaustive]
pub enum MapError {
    /// Char cannot be represented by the subtable format (e.g., it is outside the Basic Multilingual Plane
    /// for a format 4 subtable).
    CharTooLarge,
    /// Glyph ID array offset is out of bounds.
    InvalidOffset,
}

impl fmt::Display for MapError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::CharTooLarge => "char cannot be represented by the `cmap` subtable",
            Self::InvalidOffset => "glyph ID array offset is out of bounds",
        })
    }
}

impl std::error::Error for MapError {}

/// Errors that can occur when subsetting a [`Font`](crate::Font).
#[derive(Debug)]
#[non_exhaustive]
pub enum SubsetError {
    /// Error parsing the source font.
    Parse(ParseError),
    /// Subset contains more glyphs than can be addressed by a 16-bit glyph ID.
    TooManyGlyphs,
}

impl fmt::Display for SubsetError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(formatter, "failed parsing source font: {err}"),
            Self::TooManyGlyphs => formatter.write_str("subset contains too many glyphs"),
        }
    }
}

impl std::error::Error for SubsetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::TooManyGlyphs => None,
        }
    }
}

impl From<ParseError> for SubsetError {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}
