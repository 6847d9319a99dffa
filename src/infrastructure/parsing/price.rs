//! Locale-tolerant price normalization
//!
//! Turns strings such as `"$1,234.56"`, `"1.234,56 €"` or `"KSh 2,499"` into a
//! canonical signed decimal. A string without digits has no price; it never
//! becomes zero.

use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;

/// Normalize a raw price string.
///
/// Separator rules:
/// - both `,` and `.` present: the later one is the decimal separator
/// - only `,`: decimal when one or two digits follow the last comma, thousands otherwise
/// - only `.`: a single dot is decimal, several dots are thousands separators
///
/// Thousands groups after the first must have exactly three digits, and the
/// decimal separator may appear once. Anything else, such as a price range
/// `"$5.99 - $10.99"`, has no single price and yields `None`.
pub fn normalize_price(raw: &str) -> Option<Decimal> {
    let filtered: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();

    if !filtered.chars().any(|c| c.is_ascii_digit()) {
        debug!("Price '{}' has no digits", raw.trim());
        return None;
    }

    let negative = filtered.starts_with('-');
    let unsigned = filtered.trim_start_matches('-');
    if unsigned.contains('-') {
        debug!("Price '{}' looks like a range", raw.trim());
        return None;
    }
    let unsigned = unsigned.strip_suffix([',', '.']).unwrap_or(unsigned);

    let decimal = match (unsigned.rfind(','), unsigned.rfind('.')) {
        (Some(comma), Some(dot)) => Some(if comma > dot { ',' } else { '.' }),
        (Some(comma), None) => (1..=2)
            .contains(&(unsigned.len() - comma - 1))
            .then_some(','),
        (None, Some(_)) => (unsigned.matches('.').count() == 1).then_some('.'),
        (None, None) => None,
    };

    let (integer, fraction) = match decimal.and_then(|sep| unsigned.rfind(sep)) {
        Some(index) => (&unsigned[..index], Some(&unsigned[index + 1..])),
        None => (unsigned, None),
    };
    let thousands = match decimal {
        Some(',') => '.',
        Some(_) => ',',
        None if integer.contains(',') => ',',
        None => '.',
    };

    let Some(integer) = strip_thousands(integer, thousands) else {
        debug!("Price '{}' has malformed digit grouping", raw.trim());
        return None;
    };
    let canonical = match fraction {
        Some(fraction) => format!("{integer}.{fraction}"),
        None => integer,
    };

    let value = parse_canonical(&canonical)?;
    Some(if negative { -value } else { value })
}

/// Remove `separator` from a grouped integer part. Every group after the
/// first must have exactly three digits and no other separator may appear.
fn strip_thousands(integer: &str, separator: char) -> Option<String> {
    if integer.contains(|c: char| matches!(c, ',' | '.') && c != separator) {
        return None;
    }
    if !integer.contains(separator) {
        return Some(integer.to_string());
    }

    let mut groups = integer.split(separator);
    let leading = groups.next()?;
    if leading.is_empty() || leading.len() > 3 {
        return None;
    }

    let mut digits = leading.to_string();
    for group in groups {
        if group.len() != 3 {
            return None;
        }
        digits.push_str(group);
    }
    Some(digits)
}

fn parse_canonical(canonical: &str) -> Option<Decimal> {
    let trimmed = canonical.trim_end_matches('.');
    let padded = if trimmed.starts_with('.') {
        format!("0{trimmed}")
    } else {
        trimmed.to_string()
    };

    match Decimal::from_str(&padded) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Canonical price '{}' rejected: {}", padded, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    #[rstest]
    #[case("1,234.56", "1234.56")]
    #[case("1.234,56", "1234.56")]
    #[case("$19.99", "19.99")]
    #[case("€1.234,00", "1234.00")]
    #[case("KSh 2,499", "2499")]
    #[case("12,5", "12.5")]
    #[case("1,234,567", "1234567")]
    #[case("1.234.567", "1234567")]
    #[case("1.234.567,89", "1234567.89")]
    #[case("US $1,299.00/ea", "1299.00")]
    #[case("  42  ", "42")]
    #[case("12,", "12")]
    #[case(".99", "0.99")]
    #[case("-$5.25", "-5.25")]
    #[case("$-5.25", "-5.25")]
    fn test_normalizes_locale_variants(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_price(raw), Some(dec(expected)), "raw = {raw:?}");
    }

    #[rstest]
    #[case("Contact us")]
    #[case("")]
    #[case("-")]
    #[case("€")]
    #[case(",.")]
    fn test_no_digits_means_no_price(#[case] raw: &str) {
        assert_eq!(normalize_price(raw), None);
    }

    #[rstest]
    #[case("US $5.99 to US $10.99")]
    #[case("$1,299.00 - $1,499.00")]
    #[case("5,99 - 10,99 €")]
    #[case("KSh 1,200 - KSh 1,500")]
    #[case("$5 - $10")]
    #[case("1.234,56,78")]
    #[case("1,234,56")]
    #[case("1.2.3")]
    #[case("12,3456")]
    #[case("1234,567")]
    fn test_ranges_and_bad_grouping_have_no_price(#[case] raw: &str) {
        assert_eq!(normalize_price(raw), None, "raw = {raw:?}");
    }

    #[test]
    fn test_separator_styles_agree() {
        let us = normalize_price("1,234.56");
        let eu = normalize_price("1.234,56");
        assert_eq!(us, eu);
    }

    fn group_thousands(integer: u64, separator: char) -> String {
        let digits = integer.to_string();
        let mut grouped = String::new();
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(separator);
            }
            grouped.push(c);
        }
        grouped
    }

    proptest! {
        #[test]
        fn prop_never_panics(raw in ".{0,40}") {
            let _ = normalize_price(&raw);
        }

        #[test]
        fn prop_us_and_eu_formats_match(integer in 0u64..1_000_000_000, cents in 0u64..100) {
            let expected = Decimal::new((integer * 100 + cents) as i64, 2);
            let us = format!("${}.{:02}", group_thousands(integer, ','), cents);
            let eu = format!("{},{:02} €", group_thousands(integer, '.'), cents);

            prop_assert_eq!(normalize_price(&us), Some(expected));
            prop_assert_eq!(normalize_price(&eu), Some(expected));
        }
    }
}
