//! Page range specification parsing
//!
//! Translates human-entered range text such as `"1-5, 10, 15-20"` into a list
//! of inclusive [`PageRange`] values. Parsing is purely syntactic: overlapping
//! ranges are neither merged nor reordered, because merge semantics are
//! application-specific and belong to the caller.

use std::fmt;
use thiserror::Error;

/// An inclusive, 1-based page range. `start <= end` always holds for ranges
/// produced by [`parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRange {
    /// First page of the range (1-based, inclusive)
    pub start: u32,
    /// Last page of the range (1-based, inclusive)
    pub end: u32,
}

impl PageRange {
    /// Create a range covering a single page
    pub fn single(page: u32) -> Self {
        Self {
            start: page,
            end: page,
        }
    }

    /// Number of pages covered by this range.
    ///
    /// A hand-built literal with `start > end` covers no pages; [`parse`]
    /// never produces one.
    pub fn len(&self) -> usize {
        if self.start > self.end {
            0
        } else {
            (self.end - self.start + 1) as usize
        }
    }

    /// Whether this range covers no pages. Always false for parser output.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `page` (1-based) falls inside this range
    pub fn contains(&self, page: u32) -> bool {
        page >= self.start && page <= self.end
    }

    /// Iterate over the page numbers covered by this range
    pub fn pages(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Validation failure while parsing a range specification.
///
/// Every variant except [`RangeError::Empty`] carries the offending token and
/// the full original input so messages can point at the exact mistake. These
/// errors are expected user-input conditions and are always recoverable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    /// Input was empty or contained only whitespace
    #[error("page range is empty")]
    Empty,

    /// A token was neither a number nor an `N-M` pair
    #[error("invalid token \"{token}\" in page range \"{input}\"")]
    InvalidToken { token: String, input: String },

    /// A page number was zero or negative
    #[error("page number must be positive: \"{token}\" in page range \"{input}\"")]
    NonPositivePage { token: String, input: String },

    /// A dashed pair had a blank side or more than one dash
    #[error("malformed range \"{token}\" in page range \"{input}\"")]
    MalformedPair { token: String, input: String },

    /// A dashed pair ran backwards (start greater than end)
    #[error("reverse range \"{token}\" in page range \"{input}\"")]
    ReversedRange { token: String, input: String },

    /// All tokens were empty, so no ranges were produced
    #[error("no pages selected by page range \"{input}\"")]
    NoRanges { input: String },

    /// A page number exceeded the document's page count
    #[error("page {token} out of bounds in page range \"{input}\" (total: {total})")]
    PageOutOfBounds {
        token: String,
        input: String,
        total: u32,
    },
}

/// Parse a comma-separated range specification into ordered [`PageRange`]s.
///
/// Grammar: tokens are either a single positive integer `"N"` or a dashed
/// pair `"N-M"`. Whitespace around tokens and around the dash is ignored;
/// empty tokens (consecutive commas) are skipped. Output preserves input
/// order and performs no merging or de-duplication.
pub fn parse(text: &str) -> Result<Vec<PageRange>, RangeError> {
    if text.trim().is_empty() {
        return Err(RangeError::Empty);
    }

    let mut ranges = Vec::new();

    for token in text.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        ranges.push(parse_token(token, text)?);
    }

    if ranges.is_empty() {
        return Err(RangeError::NoRanges {
            input: text.to_string(),
        });
    }

    Ok(ranges)
}

/// Parse, bounds-check against `max_pages`, and flatten to a sorted,
/// de-duplicated list of page numbers.
///
/// This is the shape batch callers (split, merge, apply-to-range) consume
/// when overlap between ranges carries no meaning.
pub fn parse_expanded(text: &str, max_pages: u32) -> Result<Vec<u32>, RangeError> {
    let ranges = parse(text)?;

    let mut pages = Vec::new();
    for range in &ranges {
        if range.end > max_pages {
            return Err(RangeError::PageOutOfBounds {
                token: range.to_string(),
                input: text.to_string(),
                total: max_pages,
            });
        }
        pages.extend(range.pages());
    }

    pages.sort_unstable();
    pages.dedup();

    Ok(pages)
}

fn parse_token(token: &str, input: &str) -> Result<PageRange, RangeError> {
    // A token that reads as a whole signed integer is a single page. This
    // also catches "-3" and "0" as non-positive pages rather than malformed
    // pairs.
    if let Ok(n) = token.parse::<i64>() {
        let page = check_page(n, token, input)?;
        return Ok(PageRange::single(page));
    }

    if token.contains('-') {
        let sides: Vec<&str> = token.split('-').map(str::trim).collect();
        if sides.len() != 2 || sides.iter().any(|s| s.is_empty()) {
            return Err(RangeError::MalformedPair {
                token: token.to_string(),
                input: input.to_string(),
            });
        }

        let start = parse_side(sides[0], token, input)?;
        let end = parse_side(sides[1], token, input)?;

        if start > end {
            return Err(RangeError::ReversedRange {
                token: token.to_string(),
                input: input.to_string(),
            });
        }

        return Ok(PageRange { start, end });
    }

    Err(RangeError::InvalidToken {
        token: token.to_string(),
        input: input.to_string(),
    })
}

fn parse_side(side: &str, token: &str, input: &str) -> Result<u32, RangeError> {
    let n = side.parse::<i64>().map_err(|_| RangeError::InvalidToken {
        token: token.to_string(),
        input: input.to_string(),
    })?;
    check_page(n, token, input)
}

fn check_page(n: i64, token: &str, input: &str) -> Result<u32, RangeError> {
    if n <= 0 {
        return Err(RangeError::NonPositivePage {
            token: token.to_string(),
            input: input.to_string(),
        });
    }
    u32::try_from(n).map_err(|_| RangeError::InvalidToken {
        token: token.to_string(),
        input: input.to_string(),
    })
}
