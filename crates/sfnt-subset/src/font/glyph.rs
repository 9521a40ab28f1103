//! `Glyph` and related types.

use super::Cursor;
use crate::ParseError;

/// Glyph from the `glyf` table.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Glyph<'a> {
    /// Glyph without outline data (e.g., a space).
    Empty,
    /// Glyph described by its contours.
    Simple(SimpleGlyph<'a>),
    /// Glyph composed of other glyphs.
    Composite(CompositeGlyph<'a>),
}

impl<'a> Glyph<'a> {
    pub(crate) fn parse(raw: Cursor<'a>) -> Result<Self, ParseError> {
        if raw.bytes.is_empty() {
            return Ok(Self::Empty);
        }

        let mut peek = raw;
        let number_of_contours = peek.read_i16()?;
        if number_of_contours < 0 {
            CompositeGlyph::parse(raw).map(Self::Composite)
        } else {
            SimpleGlyph::parse(raw).map(Self::Simple)
        }
    }

    /// Returns the number of contours. Composite glyphs return -1.
    pub fn number_of_contours(&self) -> i16 {
        match self {
            Self::Empty => 0,
            Self::Simple(glyph) => glyph.number_of_contours,
            Self::Composite(_) => -1,
        }
    }

    /// Returns the hinting instructions for this glyph.
    pub fn instructions(&self) -> &'a [u8] {
        match self {
            Self::Empty => &[],
            Self::Simple(glyph) => glyph.instructions(),
            Self::Composite(glyph) => glyph.instructions,
        }
    }

    /// Returns the size of the hinting instructions in bytes.
    pub fn instruction_size(&self) -> usize {
        self.instructions().len()
    }

    /// Returns the number of padding bytes after the glyph data.
    pub fn padding(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Simple(glyph) => glyph.padding,
            Self::Composite(glyph) => glyph.padding,
        }
    }
}

/// Glyph described by its contours.
#[derive(Debug, Clone)]
pub struct SimpleGlyph<'a> {
    pub(crate) raw: &'a [u8],
    pub(crate) number_of_contours: i16,
    /// Offset of the `instructionLength` field.
    pub(crate) instructions_offset: usize,
    pub(crate) instructions_len: usize,
    pub(crate) padding: usize,
}

impl<'a> SimpleGlyph<'a> {
    const X_SHORT_VECTOR: u8 = 0x02;
    const Y_SHORT_VECTOR: u8 = 0x04;
    const REPEAT_FLAG: u8 = 0x08;
    const X_IS_SAME_OR_POSITIVE: u8 = 0x10;
    const Y_IS_SAME_OR_POSITIVE: u8 = 0x20;

    fn parse(raw: Cursor<'a>) -> Result<Self, ParseError> {
        let mut cursor = raw;
        let number_of_contours = cursor.read_i16()?;
        cursor.skip(8)?; // xMin, yMin, xMax, yMax

        let mut point_count = 0_usize;
        for _ in 0..number_of_contours {
            point_count = usize::from(cursor.read_u16()?) + 1;
        }

        let instructions_offset = cursor.offset() - raw.offset();
        let instructions_len = usize::from(cursor.read_u16()?);
        cursor.skip(instructions_len)?;

        let (mut x_len, mut y_len) = (0_usize, 0_usize);
        let mut flag_count = 0;
        while flag_count < point_count {
            let flags = cursor.read_u8()?;
            let repeat = if flags & Self::REPEAT_FLAG != 0 {
                usize::from(cursor.read_u8()?) + 1
            } else {
                1
            };
            if flags & Self::X_SHORT_VECTOR != 0 {
                x_len += repeat;
            } else if flags & Self::X_IS_SAME_OR_POSITIVE == 0 {
                x_len += 2 * repeat;
            }
            if flags & Self::Y_SHORT_VECTOR != 0 {
                y_len += repeat;
            } else if flags & Self::Y_IS_SAME_OR_POSITIVE == 0 {
                y_len += 2 * repeat;
            }
            flag_count += repeat;
        }
        cursor.skip(x_len + y_len)?;

        Ok(Self {
            raw: raw.bytes,
            number_of_contours,
            instructions_offset,
            instructions_len,
            padding: cursor.bytes.len(),
        })
    }

    /// Returns the number of contours in this glyph.
    pub fn number_of_contours(&self) -> i16 {
        self.number_of_contours
    }

    /// Returns the hinting instructions for this glyph.
    pub fn instructions(&self) -> &'a [u8] {
        let start = self.instructions_offset + 2;
        &self.raw[start..start + self.instructions_len]
    }

    /// Returns the glyph data without trailing padding.
    pub(crate) fn data(&self) -> &'a [u8] {
        &self.raw[..self.raw.len() - self.padding]
    }

    /// Returns the glyph data with instructions removed, split around the zeroed `instructionLength`.
    pub(crate) fn split_around_instructions(&self) -> (&'a [u8], &'a [u8]) {
        let data = self.data();
        let head = &data[..self.instructions_offset];
        let tail = &data[self.instructions_offset + 2 + self.instructions_len..];
        (head, tail)
    }
}

/// Glyph composed of other glyphs.
#[derive(Debug, Clone)]
pub struct CompositeGlyph<'a> {
    /// xMin, yMin, xMax, yMax
    pub(crate) header: [u8; 8],
    pub(crate) components: Vec<GlyphComponent>,
    /// Optional instructions after the last component descriptor.
    pub(crate) instructions: &'a [u8],
    pub(crate) padding: usize,
}

impl<'a> CompositeGlyph<'a> {
    fn parse(mut cursor: Cursor<'a>) -> Result<Self, ParseError> {
        cursor.skip(2)?; // numberOfContours
        let header = cursor.read_byte_array::<8>()?;
        let mut has_more_components = true;
        let mut has_instructions = false;
        let mut components = Vec::with_capacity(1);
        while has_more_components {
            let component = GlyphComponent::parse(&mut cursor)?;
            has_more_components = component.flags & GlyphComponent::MORE_COMPONENTS != 0;
            has_instructions |= component.flags & GlyphComponent::WE_HAVE_INSTRUCTIONS != 0;
            components.push(component);
        }

        let instructions = if has_instructions {
            let len = cursor.read_u16()?;
            cursor.split_at(len.into())?.bytes
        } else {
            &[]
        };
        Ok(Self {
            header,
            components,
            instructions,
            padding: cursor.bytes.len(),
        })
    }

    /// Returns the bounding box of this glyph as `[x_min, y_min, x_max, y_max]`.
    pub fn bounding_box(&self) -> [i16; 4] {
        let [a, b, c, d, e, f, g, h] = self.header;
        [
            i16::from_be_bytes([a, b]),
            i16::from_be_bytes([c, d]),
            i16::from_be_bytes([e, f]),
            i16::from_be_bytes([g, h]),
        ]
    }

    /// Returns glyph components.
    pub fn components(&self) -> &[GlyphComponent] {
        &self.components
    }
}

/// Component of a [`CompositeGlyph`].
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphComponent {
    pub(crate) flags: u16,
    pub(crate) glyph_idx: u16,
    pub(crate) args: GlyphComponentArgs,
    pub(crate) transform: TransformData,
}

impl GlyphComponent {
    const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
    const ARGS_ARE_XY_VALUES: u16 = 0x0002;
    const WE_HAVE_A_SCALE: u16 = 0x0008;
    pub(crate) const MORE_COMPONENTS: u16 = 0x0020;
    const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
    const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;
    pub(crate) const WE_HAVE_INSTRUCTIONS: u16 = 0x0100;

    fn parse(cursor: &mut Cursor<'_>) -> Result<Self, ParseError> {
        let flags = cursor.read_u16()?;
        let glyph_idx = cursor.read_u16()?;
        let args = if flags & Self::ARG_1_AND_2_ARE_WORDS != 0 {
            GlyphComponentArgs::U32(cursor.read_u32()?)
        } else {
            GlyphComponentArgs::U16(cursor.read_u16()?)
        };
        let transform = if flags & Self::WE_HAVE_A_SCALE != 0 {
            TransformData::Scale(cursor.read_u16()?)
        } else if flags & Self::WE_HAVE_AN_X_AND_Y_SCALE != 0 {
            TransformData::TwoScales([cursor.read_u16()?, cursor.read_u16()?])
        } else if flags & Self::WE_HAVE_A_TWO_BY_TWO != 0 {
            TransformData::Affine([
                cursor.read_u16()?,
                cursor.read_u16()?,
                cursor.read_u16()?,
                cursor.read_u16()?,
            ])
        } else {
            TransformData::None
        };
        Ok(Self {
            flags,
            glyph_idx,
            args,
            transform,
        })
    }

    /// Returns component flags.
    pub fn flags(&self) -> u16 {
        self.flags
    }

    /// Returns the index of the referenced glyph.
    pub fn glyph_idx(&self) -> u16 {
        self.glyph_idx
    }

    /// Returns the component arguments: either an `(x, y)` offset or a pair of point numbers,
    /// depending on the `ARGS_ARE_XY_VALUES` flag.
    #[allow(clippy::cast_possible_wrap)] // intentional
    pub fn arguments(&self) -> (i32, i32) {
        let are_signed = self.flags & Self::ARGS_ARE_XY_VALUES != 0;
        match self.args {
            GlyphComponentArgs::U32(args) => {
                let [a, b, c, d] = args.to_be_bytes();
                let (first, second) = (u16::from_be_bytes([a, b]), u16::from_be_bytes([c, d]));
                if are_signed {
                    ((first as i16).into(), (second as i16).into())
                } else {
                    (first.into(), second.into())
                }
            }
            GlyphComponentArgs::U16(args) => {
                let [first, second] = args.to_be_bytes();
                if are_signed {
                    ((first as i8).into(), (second as i8).into())
                } else {
                    (first.into(), second.into())
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum GlyphComponentArgs {
    U16(u16),
    U32(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TransformData {
    None,
    Scale(u16),
    TwoScales([u16; 2]),
    Affine([u16; 4]),
}
