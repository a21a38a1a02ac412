//! Display formatting for KPI values.

/// Digit-group separator (U+202F NARROW NO-BREAK SPACE).
pub const GROUP_SEPARATOR: char = '\u{202f}';

/// Placeholder for missing values.
pub const MISSING: &str = "N/A";

/// Format a number for a KPI card.
///
/// Values with an absolute value of at least 100 are rendered without
/// decimals, smaller ones with `decimals` places. The integer part is
/// grouped by thousands with [`GROUP_SEPARATOR`].
pub fn format_number(value: Option<f64>, decimals: usize) -> String {
    let Some(value) = value.filter(|v| !v.is_nan()) else {
        return MISSING.to_string();
    };
    if value.is_infinite() {
        return value.to_string();
    }

    let decimals = if value.abs() >= 100.0 { 0 } else { decimals };
    let rendered = format!("{:.*}", decimals, value.abs());
    let (integer, fraction) = match rendered.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (rendered.as_str(), None),
    };

    let mut out = String::with_capacity(rendered.len() + integer.len() / 3 + 1);
    if value.is_sign_negative() && value != 0.0 {
        out.push('-');
    }
    out.push_str(&group_thousands(integer));
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

/// Format a ratio as a percentage, e.g. `0.42` becomes `"42.0%"` with one decimal.
pub fn format_percent(value: Option<f64>, decimals: usize) -> String {
    match value.filter(|v| !v.is_nan()) {
        Some(value) => format!("{:.*}%", decimals, value * 100.0),
        None => MISSING.to_string(),
    }
}

/// Format an integer count.
pub fn format_count(count: usize) -> String {
    format_number(Some(count as f64), 0)
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(GROUP_SEPARATOR);
        }
        out.push(digit);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_large_values_drop_decimals() {
        assert_eq!(format_number(Some(600.0), 2), "600");
        assert_eq!(format_number(Some(1234.56), 2), "1\u{202f}235");
        assert_eq!(format_number(Some(1_234_567.0), 2), "1\u{202f}234\u{202f}567");
        assert_eq!(format_number(Some(-2500.4), 2), "-2\u{202f}500");
    }

    #[test]
    fn test_small_values_keep_decimals() {
        assert_eq!(format_number(Some(12.346), 2), "12.35");
        assert_eq!(format_number(Some(0.5), 2), "0.50");
        assert_eq!(format_number(Some(-3.0), 2), "-3.00");
        assert_eq!(format_number(Some(99.994), 2), "99.99");
    }

    #[test]
    fn test_counts() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(7), "7");
        assert_eq!(format_count(12_500), "12\u{202f}500");
    }

    #[test]
    fn test_percent() {
        assert_eq!(format_percent(Some(0.42), 1), "42.0%");
        assert_eq!(format_percent(Some(0.2), 1), "20.0%");
        assert_eq!(format_percent(Some(1.5), 1), "150.0%");
    }

    #[test]
    fn test_missing_values() {
        assert_eq!(format_number(None, 2), "N/A");
        assert_eq!(format_number(Some(f64::NAN), 0), "N/A");
        assert_eq!(format_percent(None, 1), "N/A");
        assert_eq!(format_percent(Some(f64::NAN), 1), "N/A");
    }

    proptest! {
        #[test]
        fn prop_formatters_never_panic(value in proptest::option::of(any::<f64>()), decimals in 0usize..6) {
            let number = format_number(value, decimals);
            let percent = format_percent(value, decimals);
            prop_assert!(!number.is_empty());
            prop_assert!(!percent.is_empty());
        }

        #[test]
        fn prop_large_values_have_no_fraction(value in 100.0f64..1e12) {
            prop_assert!(!format_number(Some(value), 2).contains('.'));
        }
    }
}
