//! `post` table processing.

use core::str;

use super::Cursor;
use crate::{errors::ParseErrorKind, ParseError};

/// The 258 standard glyph names defined for Macintosh TrueType fonts, in the order
/// of their indices in the `post` table version 2.0.
#[rustfmt::skip]
pub static MAC_GLYPH_NAMES: [&str; 258] = [
    ".notdef", ".null", "nonmarkingreturn", "space", "exclam", "quotedbl", "numbersign", "dollar",
    "percent", "ampersand", "quotesingle", "parenleft", "parenright", "asterisk", "plus", "comma",
    "hyphen", "period", "slash", "zero", "one", "two", "three", "four", "five", "six", "seven",
    "eight", "nine", "colon", "semicolon", "less", "equal", "greater", "question", "at", "A", "B",
    "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q", "R", "S", "T", "U",
    "V", "W", "X", "Y", "Z", "bracketleft", "backslash", "bracketright", "asciicircum",
    "underscore", "grave", "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n",
    "o", "p", "q", "r", "s", "t", "u", "v", "w", "x", "y", "z", "braceleft", "bar", "braceright",
    "asciitilde", "Adieresis", "Aring", "Ccedilla", "Eacute", "Ntilde", "Odieresis", "Udieresis",
    "aacute", "agrave", "acircumflex", "adieresis", "atilde", "aring", "ccedilla", "eacute",
    "egrave", "ecircumflex", "edieresis", "iacute", "igrave", "icircumflex", "idieresis", "ntilde",
    "oacute", "ograve", "ocircumflex", "odieresis", "otilde", "uacute", "ugrave", "ucircumflex",
    "udieresis", "dagger", "degree", "cent", "sterling", "section", "bullet", "paragraph",
    "germandbls", "registered", "copyright", "trademark", "acute", "dieresis", "notequal", "AE",
    "Oslash", "infinity", "plusminus", "lessequal", "greaterequal", "yen", "mu", "partialdiff",
    "summation", "product", "pi", "integral", "ordfeminine", "ordmasculine", "Omega", "ae",
    "oslash", "questiondown", "exclamdown", "logicalnot", "radical", "florin", "approxequal",
    "Delta", "guillemotleft", "guillemotright", "ellipsis", "nonbreakingspace", "Agrave", "Atilde",
    "Otilde", "OE", "oe", "endash", "emdash", "quotedblleft", "quotedblright", "quoteleft",
    "quoteright", "divide", "lozenge", "ydieresis", "Ydieresis", "fraction", "currency",
    "guilsinglleft", "guilsinglright", "fi", "fl", "daggerdbl", "periodcentered", "quotesinglbase",
    "quotedblbase", "perthousand", "Acircumflex", "Ecircumflex", "Aacute", "Edieresis", "Egrave",
    "Iacute", "Icircumflex", "Idieresis", "Igrave", "Oacute", "Ocircumflex", "apple", "Ograve",
    "Uacute", "Ucircumflex", "Ugrave", "dotlessi", "circumflex", "tilde", "macron", "breve",
    "dotaccent", "ring", "cedilla", "hungarumlaut", "ogonek", "caron", "Lslash", "lslash",
    "Scaron", "scaron", "Zcaron", "zcaron", "brokenbar", "Eth", "eth", "Yacute", "yacute", "Thorn",
    "thorn", "minus", "multiply", "onesuperior", "twosuperior", "threesuperior", "onehalf",
    "onequarter", "threequarters", "franc", "Gbreve", "gbreve", "Idotaccent", "Scedilla",
    "scedilla", "Cacute", "cacute", "Ccaron", "ccaron", "dcroat",
];

/// Header fields of the `post` table shared by all table versions (everything after the version).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostHeader {
    /// Italic angle in counter-clockwise degrees from the vertical, as a 16.16 fixed-point number.
    pub italic_angle: i32,
    /// Suggested distance of the top of the underline from the baseline.
    pub underline_position: i16,
    /// Suggested underline thickness.
    pub underline_thickness: i16,
    /// Non-zero if the font is monospaced.
    pub is_fixed_pitch: u32,
    /// Minimum memory usage when the font is downloaded as a Type 42 font.
    pub min_mem_type42: u32,
    /// Maximum memory usage when the font is downloaded as a Type 42 font.
    pub max_mem_type42: u32,
    /// Minimum memory usage when the font is downloaded as a Type 1 font.
    pub min_mem_type1: u32,
    /// Maximum memory usage when the font is downloaded as a Type 1 font.
    pub max_mem_type1: u32,
}

impl PostHeader {
    /// Byte length of the header including the version field.
    pub(crate) const LEN: usize = 32;

    fn parse(cursor: &mut Cursor<'_>) -> Result<Self, ParseError> {
        Ok(Self {
            italic_angle: cursor.read_u32()? as i32,
            underline_position: cursor.read_i16()?,
            underline_thickness: cursor.read_i16()?,
            is_fixed_pitch: cursor.read_u32()?,
            min_mem_type42: cursor.read_u32()?,
            max_mem_type42: cursor.read_u32()?,
            min_mem_type1: cursor.read_u32()?,
            max_mem_type1: cursor.read_u32()?,
        })
    }

    pub(crate) fn write(&self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(&self.italic_angle.to_be_bytes());
        buffer.extend_from_slice(&self.underline_position.to_be_bytes());
        buffer.extend_from_slice(&self.underline_thickness.to_be_bytes());
        for field in [
            self.is_fixed_pitch,
            self.min_mem_type42,
            self.max_mem_type42,
            self.min_mem_type1,
            self.max_mem_type1,
        ] {
            buffer.extend_from_slice(&field.to_be_bytes());
        }
    }
}

#[derive(Debug, Clone)]
enum GlyphNames<'a> {
    /// Version 1.0: the standard Macintosh glyph order.
    Standard,
    /// Version 2.0: per-glyph indices + Pascal strings.
    Indexed {
        indices: Vec<u16>,
        custom_names: Vec<&'a str>,
    },
    /// Version 3.0 and others: no glyph names.
    None,
}

/// Parsed `post` table.
#[derive(Debug, Clone)]
pub struct PostTable<'a> {
    version: u32,
    header: PostHeader,
    names: GlyphNames<'a>,
    len: usize,
}

impl<'a> PostTable<'a> {
    /// Version 1.0 of the table.
    pub const VERSION_1: u32 = 0x_0001_0000;
    /// Version 2.0 of the table.
    pub const VERSION_2: u32 = 0x_0002_0000;
    /// Version 3.0 of the table.
    pub const VERSION_3: u32 = 0x_0003_0000;

    pub(crate) fn parse(mut cursor: Cursor<'a>) -> Result<Self, ParseError> {
        let len = cursor.bytes.len();
        let version = cursor.read_u32()?;
        let header = PostHeader::parse(&mut cursor)?;

        let names = match version {
            Self::VERSION_1 => GlyphNames::Standard,
            Self::VERSION_2 => Self::parse_names(&mut cursor)?,
            Self::VERSION_3 | 0x_0002_5000 => GlyphNames::None,
            _ => return Err(cursor.err(ParseErrorKind::UnexpectedTableVersion(version))),
        };
        Ok(Self {
            version,
            header,
            names,
            len,
        })
    }

    fn parse_names(cursor: &mut Cursor<'a>) -> Result<GlyphNames<'a>, ParseError> {
        let glyph_count = cursor.read_u16()?;
        let indices = (0..glyph_count)
            .map(|_| cursor.read_u16())
            .collect::<Result<Vec<_>, _>>()?;

        let mut custom_names = vec![];
        while !cursor.bytes.is_empty() {
            let name_len = cursor.read_u8()?;
            let name_cursor = cursor.split_at(name_len.into())?;
            let name = str::from_utf8(name_cursor.bytes)
                .ok()
                .filter(|name| name.is_ascii())
                .ok_or_else(|| name_cursor.err(ParseErrorKind::InvalidGlyphName))?;
            custom_names.push(name);
        }
        Ok(GlyphNames::Indexed {
            indices,
            custom_names,
        })
    }

    /// Returns the table version, e.g. [`Self::VERSION_2`].
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Returns the table header.
    pub fn header(&self) -> &PostHeader {
        &self.header
    }

    /// Returns the byte length of the table.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Checks whether the table data is empty. Always `false` for a parsed table.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of glyphs with names, or `None` if the table does not contain glyph names.
    pub fn number_of_glyphs(&self) -> Option<usize> {
        match &self.names {
            GlyphNames::Standard => Some(MAC_GLYPH_NAMES.len()),
            GlyphNames::Indexed { indices, .. } => Some(indices.len()),
            GlyphNames::None => None,
        }
    }

    /// Returns the name of the specified glyph, or `None` if the name is not known.
    pub fn glyph_name(&self, glyph_idx: u16) -> Option<&'a str> {
        let glyph_idx = usize::from(glyph_idx);
        match &self.names {
            GlyphNames::Standard => MAC_GLYPH_NAMES.get(glyph_idx).copied(),
            GlyphNames::Indexed {
                indices,
                custom_names,
            } => {
                let name_idx = usize::from(*indices.get(glyph_idx)?);
                if let Some(&name) = MAC_GLYPH_NAMES.get(name_idx) {
                    Some(name)
                } else {
                    custom_names.get(name_idx - MAC_GLYPH_NAMES.len()).copied()
                }
            }
            GlyphNames::None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TableTag;

    fn post_bytes(version: u32, tail: &[u8]) -> Vec<u8> {
        let mut bytes = version.to_be_bytes().to_vec();
        PostHeader {
            italic_angle: -12 << 16,
            underline_position: -75,
            underline_thickness: 50,
            ..PostHeader::default()
        }
        .write(&mut bytes);
        bytes.extend_from_slice(tail);
        bytes
    }

    #[test]
    fn mac_glyph_names_are_consistent() {
        assert_eq!(MAC_GLYPH_NAMES[0], ".notdef");
        assert_eq!(MAC_GLYPH_NAMES[6], "numbersign");
        assert_eq!(MAC_GLYPH_NAMES[257], "dcroat");
    }

    #[test]
    fn reading_version_1_table() {
        let bytes = post_bytes(PostTable::VERSION_1, &[]);
        assert_eq!(bytes.len(), PostHeader::LEN);
        let post = PostTable::parse(Cursor::for_table(TableTag::POST, &bytes)).unwrap();
        assert_eq!(post.header().underline_position, -75);
        assert_eq!(post.header().italic_angle, -12 << 16);
        assert_eq!(post.number_of_glyphs(), Some(258));
        assert_eq!(post.glyph_name(3), Some("space"));
        assert_eq!(post.glyph_name(258), None);
    }

    #[test]
    fn reading_version_2_table() {
        let tail = [0, 3, 0, 0, 1, 2, 0, 1, 2, b'h', b'i'];
        let bytes = post_bytes(PostTable::VERSION_2, &tail);
        let post = PostTable::parse(Cursor::for_table(TableTag::POST, &bytes)).unwrap();
        assert_eq!(post.number_of_glyphs(), Some(3));
        assert_eq!(post.glyph_name(0), Some(".notdef"));
        assert_eq!(post.glyph_name(1), Some("hi"));
        assert_eq!(post.glyph_name(2), Some(".null"));
        assert_eq!(post.glyph_name(3), None);
    }

    #[test]
    fn reading_version_3_table() {
        let bytes = post_bytes(PostTable::VERSION_3, &[]);
        let post = PostTable::parse(Cursor::for_table(TableTag::POST, &bytes)).unwrap();
        assert_eq!(post.number_of_glyphs(), None);
        assert_eq!(post.glyph_name(0), None);
    }

    #[test]
    fn invalid_glyph_name() {
        let tail = [0, 1, 1, 2, 2, 0xff, 0xfe];
        let bytes = post_bytes(PostTable::VERSION_2, &tail);
        let err = PostTable::parse(Cursor::for_table(TableTag::POST, &bytes)).unwrap_err();
        assert!(matches!(err.kind(), ParseErrorKind::InvalidGlyphName));
        assert_eq!(err.offset(), 37);
    }
}
