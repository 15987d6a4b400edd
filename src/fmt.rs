use std::str::FromStr;

use rust_decimal::Decimal;

/// Parse the leading number of an amount cell (`-50.00`, `12.5 EUR`).
/// A comma decimal separator is accepted in place of a period.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let normalized = raw.trim().replacen(',', ".", 1);
    let prefix = numeric_prefix(&normalized);
    if prefix.is_empty() {
        return None;
    }
    Decimal::from_str(prefix).ok()
}

fn numeric_prefix(s: &str) -> &str {
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'-') | Some(b'+')) {
        end = 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }
    if digits == 0 {
        return "";
    }
    &s[..end]
}

/// Render a magnitude without trailing zeros: 50.00 -> "50", 12.50 -> "12.5".
pub fn magnitude(val: Decimal) -> String {
    val.abs().normalize().to_string()
}
