//! `name` table processing.

use std::borrow::Cow;

use super::Cursor;
use crate::{errors::ParseErrorKind, ParseError};

/// Single record in the [`NameTable`].
#[derive(Debug, Clone)]
pub struct NameRecord<'a> {
    /// Platform ID (e.g., 3 for Windows).
    pub platform_id: u16,
    /// Platform-specific encoding ID.
    pub encoding_id: u16,
    /// Language ID.
    pub language_id: u16,
    /// Name ID (e.g., 1 for the font family name).
    pub name_id: u16,
    raw: &'a [u8],
}

impl<'a> NameRecord<'a> {
    /// Returns the raw string bytes in the platform encoding.
    pub fn raw(&self) -> &'a [u8] {
        self.raw
    }

    /// Decodes the record string. Strings for Unicode and Windows platforms are decoded
    /// as UTF-16BE, others as Latin-1. Invalid code units are replaced with `U+FFFD`.
    pub fn decode(&self) -> Cow<'a, str> {
        match self.platform_id {
            0 | 3 => {
                let units = self
                    .raw
                    .chunks_exact(2)
                    .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]));
                let decoded = char::decode_utf16(units)
                    .map(|ch| ch.unwrap_or(char::REPLACEMENT_CHARACTER))
                    .collect();
                Cow::Owned(decoded)
            }
            _ => {
                if self.raw.is_ascii() {
                    // ASCII is always valid UTF-8
                    Cow::Borrowed(core::str::from_utf8(self.raw).unwrap_or_default())
                } else {
                    Cow::Owned(self.raw.iter().copied().map(char::from).collect())
                }
            }
        }
    }
}

/// Parsed `name` table.
#[derive(Debug, Clone)]
pub struct NameTable<'a> {
    format: u16,
    records: Vec<NameRecord<'a>>,
}

impl<'a> NameTable<'a> {
    const RECORD_LEN: usize = 12;

    pub(crate) fn parse(mut cursor: Cursor<'a>) -> Result<Self, ParseError> {
        let table = cursor;
        let format = cursor.read_u16_checked(|format| {
            if format > 1 {
                return Err(ParseErrorKind::UnexpectedTableFormat(format));
            }
            Ok(format)
        })?;
        let count = cursor.read_u16()?;
        let storage_offset = usize::from(cursor.read_u16()?);
        let storage = table.range(storage_offset..table.bytes.len())?;

        let mut records_cursor = cursor.split_at(usize::from(count) * Self::RECORD_LEN)?;
        let records = (0..count)
            .map(|_| {
                let platform_id = records_cursor.read_u16()?;
                let encoding_id = records_cursor.read_u16()?;
                let language_id = records_cursor.read_u16()?;
                let name_id = records_cursor.read_u16()?;
                let len = usize::from(records_cursor.read_u16()?);
                let offset = usize::from(records_cursor.read_u16()?);
                let raw = storage.range(offset..offset + len)?.bytes;
                Ok(NameRecord {
                    platform_id,
                    encoding_id,
                    language_id,
                    name_id,
                    raw,
                })
            })
            .collect::<Result<_, ParseError>>()?;
        Ok(Self { format, records })
    }

    /// Returns the table format (0 or 1).
    pub fn format(&self) -> u16 {
        self.format
    }

    /// Returns all name records in the table order.
    pub fn records(&self) -> &[NameRecord<'a>] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TableTag;

    #[test]
    fn reading_name_table() {
        let mut bytes = vec![0, 0, 0, 2, 0, 30];
        // Mac Roman family name
        bytes.extend_from_slice(&[0, 1, 0, 0, 0, 0, 0, 1, 0, 4, 0, 0]);
        // Windows family name
        bytes.extend_from_slice(&[0, 3, 0, 1, 0x04, 0x09, 0, 1, 0, 6, 0, 4]);
        bytes.extend_from_slice(b"Test");
        bytes.extend_from_slice(&[0, b'T', 0, b'e', 0xd8, 0x00]);

        let name = NameTable::parse(Cursor::for_table(TableTag::NAME, &bytes)).unwrap();
        assert_eq!(name.format(), 0);
        let records = name.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].decode(), "Test");
        assert!(matches!(records[0].decode(), Cow::Borrowed(_)));
        assert_eq!(records[1].language_id, 0x0409);
        assert_eq!(records[1].decode(), "Te\u{fffd}");
    }

    #[test]
    fn name_record_out_of_bounds() {
        let mut bytes = vec![0, 0, 0, 1, 0, 18];
        bytes.extend_from_slice(&[0, 1, 0, 0, 0, 0, 0, 1, 0, 4, 0, 0]);
        bytes.extend_from_slice(b"Te");

        let err = NameTable::parse(Cursor::for_table(TableTag::NAME, &bytes)).unwrap_err();
        assert!(matches!(
            err.kind(),
            ParseErrorKind::RangeOutOfBounds { len: 2, .. }
        ));
    }
}
