//! # Barcode Codes
//!
//! The rolling shelf-code sequence `A-001 … A-999, B-001 … Z-999, A-001 …`.
//!
//! ## Ordinal Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every code maps to an ordinal in a 25 974-step cycle (26 × 999):      │
//! │                                                                         │
//! │    A-000 →     0   (conceptual start, never issued)                    │
//! │    A-001 →     1                                                        │
//! │    A-999 →   999                                                        │
//! │    B-001 →  1000                                                        │
//! │    Z-999 → 25974 ──► next wraps to A-001 (ordinal 1)                   │
//! │                                                                         │
//! │  A database counter only has to store "how many issued so far";       │
//! │  the code is derived from it with modular arithmetic.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest numeric part of a code.
pub const MAX_CODE_NUMBER: u16 = 999;

/// Number of distinct issuable codes before the sequence wraps.
pub const CYCLE_LEN: i64 = 26 * MAX_CODE_NUMBER as i64;

/// A parsed `LETTER-NNN` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BarcodeCode {
    /// 0 = 'A' … 25 = 'Z'
    letter: u8,
    /// 0..=999 (0 only appears for legacy / conceptual start values)
    number: u16,
}

impl BarcodeCode {
    /// The conceptual code before the first issued one.
    pub const START: BarcodeCode = BarcodeCode { letter: 0, number: 0 };

    /// Parses a code; anything not exactly `[A-Z]-[0-9]{3}` yields `None`.
    ///
    /// ## Example
    /// ```rust
    /// use stitch_core::barcode::BarcodeCode;
    ///
    /// assert!(BarcodeCode::parse("A-001").is_some());
    /// assert!(BarcodeCode::parse("a-001").is_none());
    /// assert!(BarcodeCode::parse("A-01").is_none());
    /// assert!(BarcodeCode::parse("8901234567890").is_none());
    /// ```
    pub fn parse(text: &str) -> Option<Self> {
        let bytes = text.as_bytes();
        if bytes.len() != 5 || bytes[1] != b'-' {
            return None;
        }
        if !bytes[0].is_ascii_uppercase() || !bytes[2..].iter().all(u8::is_ascii_digit) {
            return None;
        }

        let number = bytes[2..]
            .iter()
            .fold(0u16, |acc, b| acc * 10 + (b - b'0') as u16);

        Some(BarcodeCode {
            letter: bytes[0] - b'A',
            number,
        })
    }

    pub fn letter(&self) -> char {
        (b'A' + self.letter) as char
    }

    pub fn number(&self) -> u16 {
        self.number
    }

    /// Position in the cycle; `A-000` is 0 and `Z-999` is [`CYCLE_LEN`].
    pub fn ordinal(&self) -> i64 {
        self.letter as i64 * MAX_CODE_NUMBER as i64 + self.number as i64
    }

    /// Code for a counter value; any positive value maps onto the cycle.
    ///
    /// ## Example
    /// ```rust
    /// use stitch_core::barcode::BarcodeCode;
    ///
    /// assert_eq!(BarcodeCode::from_ordinal(1).to_string(), "A-001");
    /// assert_eq!(BarcodeCode::from_ordinal(1000).to_string(), "B-001");
    /// assert_eq!(BarcodeCode::from_ordinal(25_975).to_string(), "A-001");
    /// ```
    pub fn from_ordinal(ordinal: i64) -> Self {
        if ordinal <= 0 {
            return Self::START;
        }
        let index = (ordinal - 1).rem_euclid(CYCLE_LEN);
        BarcodeCode {
            letter: (index / MAX_CODE_NUMBER as i64) as u8,
            number: (index % MAX_CODE_NUMBER as i64) as u16 + 1,
        }
    }

    /// The code issued after this one.
    ///
    /// Increment the number; past 999 reset to 001 and advance the letter,
    /// wrapping `Z` back to `A`.
    pub fn next(&self) -> Self {
        if self.number >= MAX_CODE_NUMBER {
            BarcodeCode {
                letter: (self.letter + 1) % 26,
                number: 1,
            }
        } else {
            BarcodeCode {
                letter: self.letter,
                number: self.number + 1,
            }
        }
    }
}

impl fmt::Display for BarcodeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:03}", self.letter(), self.number)
    }
}

/// How the next code is found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarcodeStrategy {
    /// Dedicated persisted counter, seeded once from the newest existing
    /// code. Never issues the same code twice until the cycle wraps.
    #[default]
    Counter,
    /// Scan existing products newest-first and advance the first valid
    /// code. Two concurrent callers can receive the same code.
    LatestRow,
}

/// Next code after the newest existing one, skipping malformed values.
///
/// `newest_first` must be ordered by creation time, newest first. When no
/// value parses, the sequence starts from `A-000`, so the result is `A-001`.
///
/// ## Example
/// ```rust
/// use stitch_core::barcode::next_after_latest;
///
/// let existing = ["8901234567890", "C-120", "C-119"];
/// assert_eq!(next_after_latest(existing).to_string(), "C-121");
/// assert_eq!(next_after_latest(Vec::<&str>::new()).to_string(), "A-001");
/// ```
pub fn next_after_latest<I, S>(newest_first: I) -> BarcodeCode
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    newest_first
        .into_iter()
        .find_map(|code| BarcodeCode::parse(code.as_ref()))
        .unwrap_or(BarcodeCode::START)
        .next()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let code = BarcodeCode::parse("K-042").unwrap();
        assert_eq!(code.letter(), 'K');
        assert_eq!(code.number(), 42);
        assert_eq!(code.to_string(), "K-042");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "A001", "A-1000", "AA-001", "A_001", "Ä-001", "A-0x1", " A-001"] {
            assert!(BarcodeCode::parse(bad).is_none(), "{bad} should not parse");
        }
    }

    #[test]
    fn test_first_code_is_a001() {
        assert_eq!(BarcodeCode::START.next().to_string(), "A-001");
    }

    #[test]
    fn test_thousandth_code_is_b001() {
        let mut code = BarcodeCode::START;
        let mut issued = Vec::new();
        for _ in 0..1000 {
            code = code.next();
            issued.push(code.to_string());
        }
        assert_eq!(issued[998], "A-999");
        assert_eq!(issued[999], "B-001");
    }

    #[test]
    fn test_wraps_after_z999() {
        let last = BarcodeCode::parse("Z-999").unwrap();
        assert_eq!(last.ordinal(), CYCLE_LEN);
        assert_eq!(last.next().to_string(), "A-001");
    }

    #[test]
    fn test_ordinal_round_trip_matches_next() {
        let mut code = BarcodeCode::START;
        for ordinal in 1..=CYCLE_LEN + 5 {
            code = code.next();
            assert_eq!(BarcodeCode::from_ordinal(ordinal), code);
        }
    }

    #[test]
    fn test_legacy_zero_number_advances() {
        // "B-000" is not issued by us but may exist in imported data
        let code = BarcodeCode::parse("B-000").unwrap();
        assert_eq!(code.next().to_string(), "B-001");
    }

    #[test]
    fn test_next_after_latest_ignores_malformed() {
        let existing = vec!["bad", "also-bad", "A-005", "A-004"];
        assert_eq!(next_after_latest(&existing).to_string(), "A-006");
    }
}
