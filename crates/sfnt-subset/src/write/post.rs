//! `post` table building.

use std::{collections::HashMap, sync::OnceLock};

use super::{write_u16, write_u32};
use crate::font::{PostHeader, PostTable, MAC_GLYPH_NAMES};

fn mac_glyph_index(name: &str) -> Option<u16> {
    static INDEX: OnceLock<HashMap<&'static str, u16>> = OnceLock::new();

    let index = INDEX.get_or_init(|| {
        // `as` is fine: there are 258 names
        #[allow(clippy::cast_possible_truncation)]
        let entries = MAC_GLYPH_NAMES.iter().enumerate().map(|(i, &name)| (name, i as u16));
        entries.collect()
    });
    index.get(name).copied()
}

/// Builder of the `post` table version 2.0, which contains glyph names.
///
/// Names from the standard Macintosh glyph set ([`MAC_GLYPH_NAMES`]) are encoded as indices
/// into this set. Other names are stored as Pascal strings, each distinct name stored once.
///
/// # Examples
///
/// ```
/// # use sfnt_subset::PostTableBuilder;
/// let names = [".notdef", "numbersign", "nonstandardglyph", "dcroat", "nonstandardglyph2"];
/// let post = PostTableBuilder::new(names).build();
/// assert_eq!(post.len(), 79);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PostTableBuilder {
    header: PostHeader,
    names: Vec<String>,
}

impl PostTableBuilder {
    /// Creates a builder with glyph names ordered by glyph ID. The table header is zeroed.
    ///
    /// # Panics
    ///
    /// Panics if there are more than 65,535 names, or if any name is longer than 255 bytes.
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        let names: Vec<_> = names.into_iter().map(Into::into).collect();
        assert!(
            names.len() <= usize::from(u16::MAX),
            "too many glyph names: {}",
            names.len()
        );
        for name in &names {
            assert!(
                name.len() <= usize::from(u8::MAX),
                "glyph name `{name}` is longer than 255 bytes"
            );
        }
        Self {
            header: PostHeader::default(),
            names,
        }
    }

    /// Sets the table header (italic angle, underline metrics etc.).
    pub fn header(&mut self, header: PostHeader) -> &mut Self {
        self.header = header;
        self
    }

    /// Writes the table.
    #[allow(clippy::cast_possible_truncation)] // lengths are checked in the constructor
    pub fn build(&self) -> Vec<u8> {
        let mut indices = Vec::with_capacity(self.names.len());
        let mut custom_names = Vec::<&str>::new();
        let mut custom_indices = HashMap::<&str, u16>::new();
        for name in &self.names {
            let idx = mac_glyph_index(name).unwrap_or_else(|| {
                *custom_indices.entry(name).or_insert_with(|| {
                    custom_names.push(name);
                    (MAC_GLYPH_NAMES.len() + custom_names.len() - 1) as u16
                })
            });
            indices.push(idx);
        }

        let mut buffer = Vec::with_capacity(PostHeader::LEN + 2 + 2 * indices.len());
        write_u32(&mut buffer, PostTable::VERSION_2);
        self.header.write(&mut buffer);
        write_u16(&mut buffer, indices.len() as u16);
        for idx in indices {
            write_u16(&mut buffer, idx);
        }
        for name in custom_names {
            buffer.push(name.len() as u8);
            buffer.extend_from_slice(name.as_bytes());
        }
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{font::Cursor, TableTag};

    const SAMPLE_NAMES: [&str; 5] = [
        ".notdef",
        "numbersign",
        "nonstandardglyph",
        "dcroat",
        "nonstandardglyph2",
    ];

    #[test]
    fn building_table_with_custom_names() {
        let bytes = PostTableBuilder::new(SAMPLE_NAMES).build();
        assert_eq!(bytes.len(), 79);
        assert_eq!(bytes[..4], [0, 2, 0, 0]);
        // `numberOfGlyphs` followed by `glyphNameIndex`
        assert_eq!(
            bytes[32..44],
            [0, 5, 0, 0, 0, 6, 1, 2, 1, 1, 1, 3]
        );
        assert_eq!(bytes[44], 16);
        assert_eq!(&bytes[45..61], b"nonstandardglyph");

        let post = PostTable::parse(Cursor::for_table(TableTag::POST, &bytes)).unwrap();
        assert_eq!(post.version(), PostTable::VERSION_2);
        assert_eq!(post.number_of_glyphs(), Some(5));
        for (i, &name) in SAMPLE_NAMES.iter().enumerate() {
            assert_eq!(post.glyph_name(i as u16), Some(name));
        }
    }

    #[test]
    fn custom_names_are_deduplicated() {
        let names = ["foo", "A", "foo", "bar.alt", "foo"];
        let bytes = PostTableBuilder::new(names).build();
        assert_eq!(bytes.len(), 32 + 2 + 2 * 5 + 4 + 8);
        // All `foo` glyphs refer to the first custom name (258); `A` is a standard name
        assert_eq!(bytes[34..44], [1, 2, 0, 36, 1, 2, 1, 3, 1, 2]);
        assert_eq!(&bytes[44..48], b"\x03foo");
        assert_eq!(&bytes[48..], b"\x07bar.alt");

        let post = PostTable::parse(Cursor::for_table(TableTag::POST, &bytes)).unwrap();
        let parsed_names: Vec<_> = (0..5).map(|i| post.glyph_name(i).unwrap()).collect();
        assert_eq!(parsed_names, names);
    }

    #[test]
    fn empty_table() {
        let bytes = PostTableBuilder::new::<&str>([]).build();
        assert_eq!(bytes.len(), 34);
        let post = PostTable::parse(Cursor::for_table(TableTag::POST, &bytes)).unwrap();
        assert_eq!(post.number_of_glyphs(), Some(0));
    }

    #[test]
    fn header_is_written() {
        let header = PostHeader {
            italic_angle: -(11 << 16),
            underline_position: -100,
            underline_thickness: 50,
            is_fixed_pitch: 1,
            ..PostHeader::default()
        };
        let bytes = PostTableBuilder::new(["a"]).header(header).build();
        let post = PostTable::parse(Cursor::for_table(TableTag::POST, &bytes)).unwrap();
        assert_eq!(*post.header(), header);
    }

    #[test]
    #[should_panic(expected = "longer than 255 bytes")]
    fn overly_long_name() {
        PostTableBuilder::new(["a".repeat(256)]);
    }
}
