//! Number formatting for console summaries.

/// Format a number with thousands separators and a fixed number of decimals.
///
/// # Examples
///
/// ```
/// use trend_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5, 1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::with_capacity(fixed.len() + fixed.len() / 3 + 1);
    // "-0.0" reads oddly in a summary, so only a non-zero rounded value keeps its sign.
    if value < 0.0 && fixed.bytes().any(|b| (b'1'..=b'9').contains(&b)) {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Format a share as a percentage, e.g. `"12.5%"`.
pub fn format_percent(share: f64, decimals: usize) -> String {
    format!("{}%", format_number(share, decimals))
}

/// Format a share delta in percentage points with an explicit sign, e.g. `"+30.0%p"`.
///
/// The sign follows the rounded value, so a delta that rounds to zero is
/// printed unsigned.
pub fn format_points(delta: f64, decimals: usize) -> String {
    let body = format_number(delta, decimals);
    let rounds_to_zero = !body.bytes().any(|b| (b'1'..=b'9').contains(&b));
    if body.starts_with('-') || rounds_to_zero {
        format!("{body}%p")
    } else {
        format!("+{body}%p")
    }
}

/// Format a production volume in millions of units, e.g. `"4.5M"`.
pub fn format_millions(volume: f64, decimals: usize) -> String {
    format!("{}M", format_number(volume / 1e6, decimals))
}

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── format_number ────────────────────────────────────────────────────────

    #[test]
    fn test_format_number_zero() {
        assert_eq!(format_number(0.0, 0), "0");
        assert_eq!(format_number(0.0, 2), "0.00");
    }

    #[test]
    fn test_format_number_no_thousands() {
        assert_eq!(format_number(123.456, 2), "123.46");
    }

    #[test]
    fn test_format_number_thousands() {
        assert_eq!(format_number(1_000.0, 0), "1,000");
        assert_eq!(format_number(12_345.0, 0), "12,345");
        assert_eq!(format_number(123_456.0, 0), "123,456");
        assert_eq!(format_number(1_234_567.0, 0), "1,234,567");
    }

    #[test]
    fn test_format_number_negative() {
        assert_eq!(format_number(-9_876.5, 1), "-9,876.5");
    }

    #[test]
    fn test_format_number_negative_rounding_to_zero_drops_sign() {
        assert_eq!(format_number(-0.01, 1), "0.0");
    }

    // ── percent / points / millions ──────────────────────────────────────────

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(10.0, 1), "10.0%");
        assert_eq!(format_percent(85.04, 1), "85.0%");
    }

    #[test]
    fn test_format_points_signs() {
        assert_eq!(format_points(30.0, 1), "+30.0%p");
        assert_eq!(format_points(-2.5, 1), "-2.5%p");
        assert_eq!(format_points(0.0, 1), "0.0%p");
    }

    #[test]
    fn test_format_points_rounding_to_zero_is_unsigned() {
        assert_eq!(format_points(-0.01, 1), "0.0%p");
        assert_eq!(format_points(0.01, 1), "0.0%p");
        assert_eq!(format_points(0.06, 1), "+0.1%p");
    }

    #[test]
    fn test_format_millions() {
        assert_eq!(format_millions(4_500_000.0, 1), "4.5M");
        assert_eq!(format_millions(-1_200_000.0, 1), "-1.2M");
        assert_eq!(format_millions(12_345_678_900.0, 0), "12,346M");
    }
}
