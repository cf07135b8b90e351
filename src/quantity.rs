//! Numeric range and byte-size parsing for instance-type criteria.
//!
//! Instance-type selectors accept compact range expressions (`4`, `4-`,
//! `-16`, `4-16`, all bounds inclusive) and byte-size quantities with
//! decimal or binary suffixes (`8GB`, `8GiB`). Memory criteria without a
//! suffix are read as mebibytes, matching the unit the provider reports.

use crate::error::{Result, SelectorError};

const MIB: u64 = 1024 * 1024;

/// An inclusive numeric range with optional bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    /// Inclusive lower bound, if any.
    pub min: Option<u64>,
    /// Inclusive upper bound, if any.
    pub max: Option<u64>,
}

impl Range {
    /// Parses a range of plain integers.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError::InvalidRange`] for empty input, more than
    /// one `-` separator, non-numeric bounds, or a lower bound above the
    /// upper bound.
    pub fn parse(input: &str) -> Result<Self> {
        Self::parse_with(input, |bound| {
            bound.parse::<u64>().map_err(|_| {
                SelectorError::invalid_range(input, format!("'{bound}' is not a number")).into()
            })
        })
    }

    /// Parses a range whose bounds are memory quantities in mebibytes.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError::InvalidRange`] for a malformed range and
    /// [`SelectorError::InvalidByteSize`] for a malformed bound.
    pub fn parse_mebibytes(input: &str) -> Result<Self> {
        Self::parse_with(input, parse_mebibytes)
    }

    /// Parses a range with a caller-supplied bound parser.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError::InvalidRange`] for a malformed range and
    /// whatever `parse_bound` returns for a malformed bound.
    pub fn parse_with<F>(input: &str, parse_bound: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<u64>,
    {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SelectorError::invalid_range(input, "empty range").into());
        }

        let mut parts = trimmed.splitn(3, '-');
        let low = parts.next().unwrap_or_default().trim();
        let high = parts.next().map(str::trim);
        if parts.next().is_some() {
            return Err(
                SelectorError::invalid_range(input, "more than one '-' separator").into()
            );
        }

        let range = match high {
            // "N": exact value
            None => {
                let value = parse_bound(low)?;
                Self {
                    min: Some(value),
                    max: Some(value),
                }
            }
            // "N-": at least N
            Some("") if !low.is_empty() => Self {
                min: Some(parse_bound(low)?),
                max: None,
            },
            // "-N": at most N
            Some(high) if low.is_empty() && !high.is_empty() => Self {
                min: None,
                max: Some(parse_bound(high)?),
            },
            // "N-M": inclusive range
            Some(high) if !low.is_empty() => Self {
                min: Some(parse_bound(low)?),
                max: Some(parse_bound(high)?),
            },
            Some(_) => {
                return Err(SelectorError::invalid_range(input, "no bounds given").into());
            }
        };

        if let (Some(min), Some(max)) = (range.min, range.max) {
            if min > max {
                return Err(SelectorError::invalid_range(
                    input,
                    "lower bound exceeds upper bound",
                )
                .into());
            }
        }

        Ok(range)
    }

    /// Returns true if `value` lies within the range.
    #[must_use]
    pub fn contains(&self, value: u64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }
}

/// Parses a byte-size quantity into bytes.
///
/// Decimal suffixes (`KB`, `MB`, `GB`, `TB`, `PB`) multiply by powers of
/// 1000, binary suffixes (`KiB`, `MiB`, `GiB`, `TiB`, `PiB`) by powers of
/// 1024; suffixes are case-insensitive. A bare number is bytes. Fractional
/// values are accepted (`1.5GiB`).
///
/// # Errors
///
/// Returns [`SelectorError::InvalidByteSize`] if the input is not a number
/// followed by an optional recognized suffix.
pub fn parse_bytes(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    let split = trimmed
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(trimmed.len());
    let (number, suffix) = trimmed.split_at(split);

    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| SelectorError::InvalidByteSize {
            value: input.to_string(),
        })?;
    if value < 0.0 {
        return Err(SelectorError::InvalidByteSize {
            value: input.to_string(),
        }
        .into());
    }

    let multiplier = match suffix.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1.0,
        "kb" => 1000.0,
        "kib" => 1024.0,
        "mb" => 1000.0 * 1000.0,
        "mib" => 1024.0 * 1024.0,
        "gb" => 1000.0 * 1000.0 * 1000.0,
        "gib" => 1024.0 * 1024.0 * 1024.0,
        "tb" => 1000.0f64.powi(4),
        "tib" => 1024.0f64.powi(4),
        "pb" => 1000.0f64.powi(5),
        "pib" => 1024.0f64.powi(5),
        _ => {
            return Err(SelectorError::InvalidByteSize {
                value: input.to_string(),
            }
            .into());
        }
    };

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Ok((value * multiplier).round() as u64)
}

/// Parses a memory quantity into mebibytes.
///
/// A bare number is already mebibytes; a suffixed quantity goes through
/// [`parse_bytes`] and is converted.
///
/// # Errors
///
/// Returns [`SelectorError::InvalidByteSize`] for malformed input.
pub fn parse_mebibytes(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    if trimmed.chars().any(|c| c.is_ascii_alphabetic()) {
        Ok(parse_bytes(trimmed)? / MIB)
    } else {
        trimmed.parse::<u64>().map_err(|_| {
            SelectorError::InvalidByteSize {
                value: input.to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exact_value() {
        let range = Range::parse("4").expect("should parse");
        assert_eq!(range.min, Some(4));
        assert_eq!(range.max, Some(4));
        assert!(range.contains(4));
        assert!(!range.contains(5));
    }

    #[test]
    fn parses_min_only() {
        let range = Range::parse("8-").expect("should parse");
        assert_eq!(range.min, Some(8));
        assert_eq!(range.max, None);
        assert!(!range.contains(7));
        assert!(range.contains(8));
        assert!(range.contains(1000));
    }

    #[test]
    fn parses_max_only() {
        let range = Range::parse("-16").expect("should parse");
        assert_eq!(range.min, None);
        assert_eq!(range.max, Some(16));
        assert!(range.contains(0));
        assert!(range.contains(16));
        assert!(!range.contains(17));
    }

    #[test]
    fn parses_inclusive_range() {
        let range = Range::parse("2-8").expect("should parse");
        assert!(range.contains(2));
        assert!(range.contains(8));
        assert!(!range.contains(1));
        assert!(!range.contains(9));
    }

    #[test]
    fn rejects_malformed_ranges() {
        assert!(Range::parse("").is_err());
        assert!(Range::parse("-").is_err());
        assert!(Range::parse("1-2-3").is_err());
        assert!(Range::parse("a-b").is_err());
        assert!(Range::parse("9-1").is_err());
    }

    #[test]
    fn parses_decimal_and_binary_suffixes() {
        assert_eq!(parse_bytes("512").expect("bytes"), 512);
        assert_eq!(parse_bytes("8KB").expect("kb"), 8000);
        assert_eq!(parse_bytes("8KiB").expect("kib"), 8192);
        assert_eq!(parse_bytes("2GB").expect("gb"), 2_000_000_000);
        assert_eq!(parse_bytes("2gib").expect("gib"), 2 * 1024 * 1024 * 1024);
    }

    #[test]
    fn parses_fractional_quantities() {
        assert_eq!(parse_bytes("1.5GiB").expect("fraction"), 1_610_612_736);
        assert_eq!(parse_bytes("0.5KiB").expect("fraction"), 512);
    }

    #[test]
    fn rejects_malformed_byte_sizes() {
        assert!(parse_bytes("").is_err());
        assert!(parse_bytes("GiB").is_err());
        assert!(parse_bytes("8XB").is_err());
        assert!(parse_bytes("-1GiB").is_err());
    }

    #[test]
    fn bare_memory_quantity_is_mebibytes() {
        assert_eq!(parse_mebibytes("8192").expect("mib"), 8192);
        assert_eq!(parse_mebibytes("8GiB").expect("gib"), 8192);
        assert_eq!(parse_mebibytes("1GB").expect("gb"), 953);
    }

    #[test]
    fn memory_ranges_combine_grammar_and_units() {
        let range = Range::parse_mebibytes("4GiB-8GiB").expect("should parse");
        assert!(range.contains(4096));
        assert!(range.contains(8192));
        assert!(!range.contains(4095));
    }
}
