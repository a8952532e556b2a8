//! Record identifiers
//!
//! An id is the local date as `YYYYMMDD` followed by an 8-digit, zero-padded,
//! lowercase base-36 counter: `2026101600000001`. Fixed width makes string
//! order equal to creation order within a table.
//!
//! The counter is not stored anywhere. Each insert scans the table directory
//! for today's `<id>.dat` files and continues after the highest one, so two
//! writers on the same table must be serialized by the caller.

use std::fs;
use std::io;
use std::path::Path;

use flatstore_core::{Error, Result};

/// Number of base-36 digits in the counter
pub const COUNTER_DIGITS: usize = 8;

/// Length of the date prefix
pub const DATE_DIGITS: usize = 8;

/// Highest counter value (`zzzzzzzz`); reaching it means the day is exhausted
pub const MAX_COUNTER: u64 = 2_821_109_907_455;

/// Data file extension
pub(crate) const DATA_EXTENSION: &str = "dat";

/// Today's local date as `YYYYMMDD`
pub fn today() -> String {
    chrono::Local::now().format("%Y%m%d").to_string()
}

/// Zero-padded lowercase base-36 form of `n`
pub fn encode_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    let mut out = Vec::with_capacity(COUNTER_DIGITS);
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    while out.len() < COUNTER_DIGITS {
        out.push(b'0');
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}

/// Parse a base-36 counter (either case)
pub fn decode_base36(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    u64::from_str_radix(s, 36).ok()
}

/// Counter of an id generated on `date`, if `stem` is one
pub fn counter_of(stem: &str, date: &str) -> Option<u64> {
    if stem.len() != DATE_DIGITS + COUNTER_DIGITS || !stem.starts_with(date) {
        return None;
    }
    decode_base36(&stem[DATE_DIGITS..])
}

/// Next id for the table stored in `table_dir`, dated today
///
/// # Errors
///
/// Returns [`Error::IdentifierOverflow`] when today's counter is exhausted.
pub fn next_id(table_dir: &Path) -> Result<String> {
    next_id_on(table_dir, &today())
}

/// Next id for the table stored in `table_dir`, dated `date`
///
/// # Errors
///
/// Returns [`Error::IdentifierOverflow`] when the counter for `date` is
/// exhausted, or an I/O error if the directory cannot be listed.
pub fn next_id_on(table_dir: &Path, date: &str) -> Result<String> {
    let last = match last_counter(table_dir, date)? {
        None => 0,
        Some(n) if n >= MAX_COUNTER => {
            return Err(Error::IdentifierOverflow(format!(
                "{}{} is the last id for {}",
                date,
                encode_base36(n),
                date
            )))
        }
        Some(n) => n,
    };
    Ok(format!("{}{}", date, encode_base36(last + 1)))
}

fn last_counter(table_dir: &Path, date: &str) -> Result<Option<u64>> {
    let entries = match fs::read_dir(table_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut last = None;
    for entry in entries {
        let name = entry?.file_name();
        let Some(stem) = name
            .to_str()
            .and_then(|n| n.strip_suffix(DATA_EXTENSION))
            .and_then(|n| n.strip_suffix('.'))
        else {
            continue;
        };
        if let Some(n) = counter_of(stem, date) {
            last = last.max(Some(n));
        }
    }
    Ok(last)
}
