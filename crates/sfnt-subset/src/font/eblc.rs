//! `EBLC` table processing. Only the bitmap size records are parsed.

use super::Cursor;
use crate::{errors::ParseErrorKind, ParseError};

/// Bitmap strike description from the `EBLC` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct BitmapSize {
    /// Number of index subtables describing the strike.
    pub number_of_index_subtables: u32,
    /// First glyph covered by the strike.
    pub start_glyph_idx: u16,
    /// Last glyph covered by the strike.
    pub end_glyph_idx: u16,
    /// Horizontal pixels per em.
    pub ppem_x: u8,
    /// Vertical pixels per em.
    pub ppem_y: u8,
    /// Bits per pixel (1, 2, 4 or 8).
    pub bit_depth: u8,
}

impl BitmapSize {
    const LEN: usize = 48;

    fn parse(mut cursor: Cursor<'_>) -> Result<Self, ParseError> {
        cursor.skip(8)?; // indexSubTableArrayOffset, indexTablesSize
        let number_of_index_subtables = cursor.read_u32()?;
        cursor.skip(28)?; // colorRef, hori / vert line metrics
        Ok(Self {
            number_of_index_subtables,
            start_glyph_idx: cursor.read_u16()?,
            end_glyph_idx: cursor.read_u16()?,
            ppem_x: cursor.read_u8()?,
            ppem_y: cursor.read_u8()?,
            bit_depth: cursor.read_u8()?,
        })
    }
}

/// Parsed `EBLC` table.
#[derive(Debug, Clone)]
pub struct EblcTable {
    version: u32,
    strikes: Vec<BitmapSize>,
}

impl EblcTable {
    pub(crate) fn parse(mut cursor: Cursor<'_>) -> Result<Self, ParseError> {
        let version = cursor.read_u32_checked(|version| {
            if version >> 16 != 2 {
                return Err(ParseErrorKind::UnexpectedTableVersion(version));
            }
            Ok(version)
        })?;
        let num_sizes = cursor.read_u32()? as usize;
        let strikes = (0..num_sizes)
            .map(|_| BitmapSize::parse(cursor.split_at(BitmapSize::LEN)?))
            .collect::<Result<_, _>>()?;
        Ok(Self { version, strikes })
    }

    /// Returns the table version (e.g., `0x0002_0000`).
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Returns bitmap strikes in the table order.
    pub fn strikes(&self) -> &[BitmapSize] {
        &self.strikes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TableTag;

    #[test]
    fn reading_strikes() {
        let mut bytes = vec![0, 2, 0, 0, 0, 0, 0, 1];
        let mut strike = [0_u8; 48];
        strike[11] = 3;
        strike[40..48].copy_from_slice(&[0, 1, 0, 42, 12, 12, 1, 1]);
        bytes.extend_from_slice(&strike);

        let eblc = EblcTable::parse(Cursor::for_table(TableTag::EBLC, &bytes)).unwrap();
        assert_eq!(eblc.version(), 0x_0002_0000);
        assert_eq!(
            eblc.strikes(),
            [BitmapSize {
                number_of_index_subtables: 3,
                start_glyph_idx: 1,
                end_glyph_idx: 42,
                ppem_x: 12,
                ppem_y: 12,
                bit_depth: 1,
            }]
        );
    }

    #[test]
    fn truncated_strike() {
        let bytes = [0, 2, 0, 0, 0, 0, 0, 1, 0, 0];
        let err = EblcTable::parse(Cursor::for_table(TableTag::EBLC, &bytes)).unwrap_err();
        assert!(matches!(err.kind(), ParseErrorKind::UnexpectedEof));
        assert_eq!(err.offset(), 8);
    }
}
