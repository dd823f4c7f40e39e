//! # Voucher Numbering
//!
//! Turns the last issued number of a (type, point of sale) series into the
//! next one.
//!
//! ```text
//!   last = None        ──► FA-0001   (sequence 1)
//!   last = "FA-0041"   ──► FA-0042   (sequence 42)
//!   last = "FA-9999"   ──► FA-10000  (wider values keep their digits)
//!   last = "FA-XYZ"    ──► MalformedNumber
//! ```
//!
//! Reading the last number and inserting the new row must happen inside
//! one write transaction; the UNIQUE index on the invoices table catches
//! anything that still slips through.

use crate::error::{CoreError, CoreResult};
use crate::NUMBER_WIDTH;

/// A freshly computed voucher number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberAssignment {
    /// Human-readable number, e.g. `NCA-0003`.
    pub number: String,
    /// Numeric suffix, stored alongside for ordering.
    pub sequence: i64,
}

/// Computes the number following `last` in the `prefix` series.
pub fn next_number(prefix: &str, last: Option<&str>) -> CoreResult<NumberAssignment> {
    let previous = match last {
        Some(number) => parse_sequence(number)?,
        None => 0,
    };

    let sequence = previous + 1;
    Ok(NumberAssignment {
        number: format_number(prefix, sequence),
        sequence,
    })
}

/// Formats `prefix-NNNN`.
pub fn format_number(prefix: &str, sequence: i64) -> String {
    format!("{prefix}-{sequence:0width$}", width = NUMBER_WIDTH)
}

/// Extracts the numeric suffix after the last `-`.
pub fn parse_sequence(number: &str) -> CoreResult<i64> {
    let malformed = || CoreError::MalformedNumber {
        number: number.to_string(),
    };

    let (_, suffix) = number.rsplit_once('-').ok_or_else(malformed)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }

    suffix.parse::<i64>().map_err(|_| malformed())
}
