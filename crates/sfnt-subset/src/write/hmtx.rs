//! `hmtx` table building.

use super::write_u16;

/// Horizontal metrics of a single glyph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HorizontalMetric {
    /// Advance width in font units.
    pub advance_width: u16,
    /// Left side bearing in font units.
    pub lsb: i16,
}

impl HorizontalMetric {
    /// Creates a metric with the specified advance width and left side bearing.
    pub const fn new(advance_width: u16, lsb: i16) -> Self {
        Self { advance_width, lsb }
    }
}

impl From<(u16, i16)> for HorizontalMetric {
    fn from((advance_width, lsb): (u16, i16)) -> Self {
        Self::new(advance_width, lsb)
    }
}

/// Builder of the `hmtx` table.
///
/// A trailing run of glyphs with the same advance width is compacted: only the first glyph
/// of the run gets a full record, and the remaining glyphs are encoded with the left side
/// bearing only. The number of full records must be recorded in the `hhea` table,
/// and is available via [`Self::number_of_h_metrics()`].
///
/// # Examples
///
/// ```
/// # use sfnt_subset::{HmtxTableBuilder, HorizontalMetric};
/// let builder = HmtxTableBuilder::new([(123, 42), (123, 43), (789, 44), (789, 45)]);
/// assert_eq!(builder.number_of_h_metrics(), 3);
/// let bytes = builder.build();
/// assert_eq!(bytes.len(), 3 * 4 + 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct HmtxTableBuilder {
    metrics: Vec<HorizontalMetric>,
}

impl HmtxTableBuilder {
    /// Creates a builder from metrics ordered by glyph ID.
    ///
    /// # Panics
    ///
    /// Panics if there are more than 65,535 metrics.
    pub fn new<M: Into<HorizontalMetric>>(metrics: impl IntoIterator<Item = M>) -> Self {
        let metrics: Vec<_> = metrics.into_iter().map(Into::into).collect();
        assert!(
            metrics.len() <= usize::from(u16::MAX),
            "too many glyph metrics: {}",
            metrics.len()
        );
        Self { metrics }
    }

    /// Returns the number of full `(advanceWidth, lsb)` records, to be recorded
    /// as `numberOfHMetrics` in the `hhea` table.
    pub fn number_of_h_metrics(&self) -> u16 {
        let mut number_of_h_metrics = self.metrics.len();
        while let Some([prev, current]) = self.metrics[..number_of_h_metrics].last_chunk::<2>() {
            if prev.advance_width != current.advance_width {
                break;
            }
            number_of_h_metrics -= 1;
        }
        // Cannot overflow: the number of metrics is checked in the constructor
        u16::try_from(number_of_h_metrics).unwrap_or(u16::MAX)
    }

    /// Writes the table.
    pub fn build(&self) -> Vec<u8> {
        let number_of_h_metrics = usize::from(self.number_of_h_metrics());
        let mut buffer = Vec::with_capacity(self.metrics.len() * 4);
        for (i, metric) in self.metrics.iter().enumerate() {
            if i < number_of_h_metrics {
                write_u16(&mut buffer, metric.advance_width);
            }
            buffer.extend_from_slice(&metric.lsb.to_be_bytes());
        }
        buffer
    }
}
