//! `hmtx` table processing.

use super::Cursor;
use crate::{errors::ParseErrorKind, write::HorizontalMetric, ParseError};

/// Parsed `hmtx` table.
#[derive(Debug, Clone, Copy)]
pub struct HmtxTable<'a> {
    cursor: Cursor<'a>,
    number_of_h_metrics: u16,
    glyph_count: u16,
}

impl<'a> HmtxTable<'a> {
    pub(crate) fn parse(
        cursor: Cursor<'a>,
        number_of_h_metrics: u16,
        glyph_count: u16,
    ) -> Result<Self, ParseError> {
        if number_of_h_metrics == 0 && glyph_count > 0 {
            return Err(cursor.err(ParseErrorKind::UnexpectedTableLen {
                expected: 4,
                actual: 0,
            }));
        }
        let number_of_h_metrics = number_of_h_metrics.min(glyph_count);
        let number_of_lsbs = glyph_count - number_of_h_metrics;
        let expected_len = usize::from(number_of_h_metrics) * 4 + usize::from(number_of_lsbs) * 2;
        if cursor.bytes.len() < expected_len {
            return Err(cursor.err(ParseErrorKind::UnexpectedTableLen {
                expected: expected_len,
                actual: cursor.bytes.len(),
            }));
        }
        Ok(Self {
            cursor,
            number_of_h_metrics,
            glyph_count,
        })
    }

    /// Returns the number of full `(advanceWidth, lsb)` records.
    pub fn number_of_h_metrics(&self) -> u16 {
        self.number_of_h_metrics
    }

    /// Returns the number of trailing LSB-only entries.
    pub fn number_of_lsbs(&self) -> u16 {
        self.glyph_count - self.number_of_h_metrics
    }

    /// Returns metrics for the specified glyph.
    ///
    /// # Errors
    ///
    /// Returns an error if `glyph_idx` is out of range.
    pub fn metric(&self, glyph_idx: u16) -> Result<HorizontalMetric, ParseError> {
        if glyph_idx >= self.glyph_count {
            return Err(ParseError::glyph_out_of_range(glyph_idx, self.glyph_count));
        }

        let advance_width;
        let lsb;
        if glyph_idx < self.number_of_h_metrics {
            let offset = usize::from(glyph_idx) * 4;
            let mut cursor = self.cursor.range(offset..offset + 4)?;
            advance_width = cursor.read_u16()?;
            lsb = cursor.read_i16()?;
        } else {
            let advance_offset = usize::from(self.number_of_h_metrics - 1) * 4;
            advance_width = self
                .cursor
                .range(advance_offset..advance_offset + 2)?
                .read_u16()?;
            let lsb_offset = usize::from(self.number_of_h_metrics) * 4
                + usize::from(glyph_idx - self.number_of_h_metrics) * 2;
            lsb = self.cursor.range(lsb_offset..lsb_offset + 2)?.read_i16()?;
        }
        Ok(HorizontalMetric { advance_width, lsb })
    }

    /// Returns the advance width for the specified glyph.
    ///
    /// # Errors
    ///
    /// Returns an error if `glyph_idx` is out of range.
    pub fn advance_width(&self, glyph_idx: u16) -> Result<u16, ParseError> {
        self.metric(glyph_idx).map(|metric| metric.advance_width)
    }

    /// Returns the left side bearing for the specified glyph.
    ///
    /// # Errors
    ///
    /// Returns an error if `glyph_idx` is out of range.
    pub fn lsb(&self, glyph_idx: u16) -> Result<i16, ParseError> {
        self.metric(glyph_idx).map(|metric| metric.lsb)
    }
}
