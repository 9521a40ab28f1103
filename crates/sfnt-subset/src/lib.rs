//! OpenType table building and font subsetting.
//!
//! The crate provides:
//!
//! - Parsing of the sfnt table directory and of the tables necessary for subsetting ([`Font`]).
//! - Builders for `cmap`, `post` and `hmtx` tables ([`CmapTableBuilder`], [`PostTableBuilder`],
//!   [`HmtxTableBuilder`]).
//! - Font subsetting and hint stripping ([`Subsetter`]).
//! - Serialization of fonts in the OpenType and WOFF2 formats ([`Font::to_truetype()`],
//!   [`Font::to_woff2()`]).
//!
//! # Examples
//!
//! ```no_run
//! use sfnt_subset::{Font, Subsetter, TableTag};
//!
//! let bytes = std::fs::read("font.ttf")?;
//! let font = Font::new(&bytes)?;
//! let cmap = font.cmap()?;
//! let glyphs = "Hello, world!"
//!     .chars()
//!     .map(|ch| cmap.map_char(ch))
//!     .collect::<Result<Vec<_>, _>>()?;
//!
//! let subset = Subsetter::new(&font)
//!     .glyphs([0].into_iter().chain(glyphs))
//!     .remove_tables([TableTag::GPOS, TableTag::GSUB, TableTag::KERN])
//!     .subset()?;
//! std::fs::write("subset.ttf", subset.to_truetype())?;
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```

#![doc(html_root_url = "https://docs.rs/sfnt-subset/0.1.0")]

mod errors;
mod font;
mod subset;
#[cfg(test)]
pub(crate) mod tests;
mod write;

#[cfg(doctest)]
doc_comment::doctest!("../README.md");

pub use crate::{
    errors::{MapError, ParseError, ParseErrorKind, SubsetError},
    font::{
        BitmapSize, CmapId, CmapIdParseError, CmapSubtable, CmapTable, CompositeGlyph, EblcTable,
        Font, FontBuilder, Glyph, GlyphComponent, HmtxTable, LocaFormat, LocaTable, NameRecord,
        NameTable, PostHeader, PostTable, SimpleGlyph, TableTag, TagParseError, MAC_GLYPH_NAMES,
    },
    subset::Subsetter,
    write::{CmapTableBuilder, HmtxTableBuilder, HorizontalMetric, PostTableBuilder},
};
