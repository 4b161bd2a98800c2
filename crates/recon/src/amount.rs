//! Amount coercion.
//!
//! Amount cells are free text. Anything that does not parse as a number
//! becomes zero. The outcome records whether a non-blank value was discarded
//! so callers can count substitutions. The one hard failure is a number whose
//! magnitude the decimal type cannot hold.

use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

/// Result of coercing one amount cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coerced {
    pub value: Decimal,
    /// True when a non-blank value failed to parse and was replaced by zero.
    pub substituted: bool,
}

/// A numeric amount whose magnitude exceeds `Decimal::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfRange;

/// Parse an amount cell, falling back to zero.
///
/// Accepts plain decimals (`-12.50`, `+3`, `.5`) and scientific notation
/// (`1.5e3`). Blank cells and the `nan` marker spreadsheets emit for empty
/// numeric cells are zero without counting as a substitution.
pub fn coerce_amount(text: &str) -> Result<Coerced, OutOfRange> {
    let s = text.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") {
        return Ok(Coerced { value: Decimal::ZERO, substituted: false });
    }

    Ok(match parse_decimal(s)? {
        Some(value) => Coerced { value, substituted: false },
        None => Coerced { value: Decimal::ZERO, substituted: true },
    })
}

fn parse_decimal(s: &str) -> Result<Option<Decimal>, OutOfRange> {
    // Thousands separators and currency symbols are not numbers here.
    if s.contains(',') || s.contains('_') {
        return Ok(None);
    }
    let parsed = if s.contains(['e', 'E']) {
        Decimal::from_scientific(s).ok().map(|d| d.normalize())
    } else {
        Decimal::from_str(s).ok()
    };
    if parsed.is_some() {
        return Ok(parsed);
    }

    // Numeric text the decimal parser rejected: too large, or too many
    // fractional digits.
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v.abs() >= 1.0 => Decimal::from_f64(v).map(Some).ok_or(OutOfRange),
        Ok(v) if v.is_finite() => Ok(Some(Decimal::from_f64(v).unwrap_or(Decimal::ZERO))),
        _ => Ok(None),
    }
}
