//! Parsing of glyph / char lists like `0-5,10,0x41-0x5a`.

use std::{ops::RangeInclusive, str::FromStr};

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub(crate) enum RangeParseError {
    #[error("invalid number `{0}`; expected a decimal or a hex (`0x..` or `U+..`) value")]
    InvalidNumber(String),
    #[error("range `{0}` has its start greater than its end")]
    Reversed(String),
    #[error("value {0:#x} is out of range")]
    OutOfRange(u32),
}

fn parse_value(s: &str) -> Result<u32, RangeParseError> {
    let hex_digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("U+"))
        .or_else(|| s.strip_prefix("u+"));
    let parsed = match hex_digits {
        Some(digits) => u32::from_str_radix(digits, 16),
        None => s.parse(),
    };
    parsed.map_err(|_| RangeParseError::InvalidNumber(s.to_owned()))
}

/// Parses a comma-separated list of values and inclusive ranges.
fn parse_ranges(s: &str) -> Result<Vec<RangeInclusive<u32>>, RangeParseError> {
    s.split(',')
        .map(|part| {
            let part = part.trim();
            let Some((start, end)) = part.split_once('-') else {
                let value = parse_value(part)?;
                return Ok(value..=value);
            };
            let (start, end) = (parse_value(start.trim())?, parse_value(end.trim())?);
            if start > end {
                return Err(RangeParseError::Reversed(part.to_owned()));
            }
            Ok(start..=end)
        })
        .collect()
}

/// List of glyph IDs.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GlyphList(pub(crate) Vec<u16>);

impl FromStr for GlyphList {
    type Err = RangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut glyphs = vec![];
        for range in parse_ranges(s)? {
            let end = u16::try_from(*range.end())
                .map_err(|_| RangeParseError::OutOfRange(*range.end()))?;
            // `start <= end`, so the conversion succeeds
            let start = u16::try_from(*range.start()).unwrap_or(end);
            glyphs.extend(start..=end);
        }
        Ok(Self(glyphs))
    }
}

/// List of chars. Surrogate code points in ranges are skipped.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CharList(pub(crate) Vec<char>);

impl FromStr for CharList {
    type Err = RangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = vec![];
        for range in parse_ranges(s)? {
            if *range.end() > u32::from(char::MAX) {
                return Err(RangeParseError::OutOfRange(*range.end()));
            }
            if range.start() == range.end() {
                let ch = char::from_u32(*range.start())
                    .ok_or(RangeParseError::OutOfRange(*range.start()))?;
                chars.push(ch);
            } else {
                chars.extend(range.filter_map(char::from_u32));
            }
        }
        Ok(Self(chars))
    }
}
