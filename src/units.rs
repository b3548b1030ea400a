//! Human <-> base-unit amount conversion.
//!
//! Mirrors the behavior of the conversion helpers the dApp relied on:
//! parsing accepts `.` or `,` as the decimal separator and truncates
//! fractional digits past the token's precision toward zero; formatting
//! strips trailing zeros and carries no currency symbol.

use alloy::primitives::U256;

/// Parse a user-typed amount into base units for a token with `decimals`
/// precision. Returns `None` for anything that is not a plain positive
/// decimal number.
pub fn parse_units(text: &str, decimals: u8) -> Option<U256> {
    let text = text.trim().replace(',', ".");
    if text.is_empty() {
        return None;
    }
    let mut parts = text.splitn(2, '.');
    let int_part = parts.next().unwrap_or("");
    let frac_part = parts.next().unwrap_or("");
    if frac_part.contains('.') {
        return None; // more than one separator
    }
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }

    let scale = U256::from(10u8).pow(U256::from(decimals));
    let int_units = if int_part.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(int_part, 10).ok()?.checked_mul(scale)?
    };

    // Fractional digits beyond the token precision truncate toward zero.
    let kept: String = frac_part.chars().take(decimals as usize).collect();
    let frac_units = if kept.is_empty() {
        U256::ZERO
    } else {
        let shift = U256::from(10u8).pow(U256::from(decimals as usize - kept.len()));
        U256::from_str_radix(&kept, 10).ok()?.checked_mul(shift)?
    };

    let units = int_units.checked_add(frac_units)?;
    if units.is_zero() { None } else { Some(units) }
}

/// Format base units as a human-readable decimal string with trailing zeros
/// stripped, e.g. `1500000000000000000` at 18 decimals -> `"1.5"`.
pub fn format_units(raw: U256, decimals: u8) -> String {
    let scale = U256::from(10u8).pow(U256::from(decimals));
    let int = raw / scale;
    let frac = raw % scale;
    if frac.is_zero() {
        return int.to_string();
    }
    let mut frac = format!("{frac:0>width$}", width = decimals as usize);
    while frac.ends_with('0') {
        frac.pop();
    }
    format!("{int}.{frac}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn units(n: u64, decimals: u8) -> U256 {
        U256::from(n) * U256::from(10u8).pow(U256::from(decimals))
    }

    #[test]
    fn parse_units__whole_amount() {
        assert_eq!(parse_units("2000", 18), Some(units(2000, 18)));
    }

    #[test]
    fn parse_units__accepts_comma_separator() {
        assert_eq!(parse_units("1,5", 18), parse_units("1.5", 18));
    }

    #[test]
    fn parse_units__truncates_excess_precision_toward_zero() {
        // 0.1234 at 2 decimals keeps 12, never rounds up to 13
        assert_eq!(parse_units("0.1299", 2), Some(U256::from(12u64)));
    }

    #[test]
    fn parse_units__rejects_garbage() {
        for bad in ["", "  ", "abc", "1.2.3", "-5", "1e18", "+4", "0", "0.0"] {
            assert_eq!(parse_units(bad, 18), None, "input {bad:?}");
        }
    }

    #[test]
    fn parse_units__bare_fraction() {
        assert_eq!(parse_units(".5", 1), Some(U256::from(5u64)));
    }

    #[test]
    fn format_units__strips_trailing_zeros() {
        assert_eq!(format_units(units(2000, 18), 18), "2000");
        assert_eq!(
            format_units(U256::from(1_500_000u64), 6),
            "1.5"
        );
        assert_eq!(format_units(U256::from(1u64), 6), "0.000001");
    }

    proptest! {
        // Round-trip law: format then parse is the identity on base units.
        #[test]
        fn round_trip__format_then_parse(raw in 1u128..=u128::MAX, decimals in 0u8..=18) {
            let raw = U256::from(raw);
            let text = format_units(raw, decimals);
            prop_assert_eq!(parse_units(&text, decimals), Some(raw));
        }
    }
}
