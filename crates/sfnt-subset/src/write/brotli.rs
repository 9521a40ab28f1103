//! Brotli compression support.

use std::io::Write as _;

use super::FontWriter;

impl FontWriter {
    const BROTLI_BUFFER_SIZE: usize = 4_096;
    const BROTLI_QUALITY: u32 = 11;
    const BROTLI_LG_WINDOW_SIZE: u32 = 22;

    /// Compresses concatenated table data. Unlike with the OpenType format, table data is not padded.
    /// Must be called after table offsets are adjusted.
    pub(super) fn compress_data(&self) -> Vec<u8> {
        let data_offset = self.tables.first().map_or(0, |record| record.offset as usize);
        let mut compressor = ::brotli::CompressorWriter::new(
            Vec::new(),
            Self::BROTLI_BUFFER_SIZE,
            Self::BROTLI_QUALITY,
            Self::BROTLI_LG_WINDOW_SIZE,
        );
        for record in &self.tables {
            let start = record.offset as usize - data_offset;
            let table = &self.table_data[start..start + record.length as usize];
            compressor
                .write_all(table)
                .expect("Writing to Vec never fails");
        }
        compressor.into_inner()
    }
}
