//! Lenient parsing of user-entered numbers.
//!
//! Money fields accept the way people type amounts (`$1,234.56`, ` 12 `).
//! Rate fields never fail: anything unusable falls back to a default.
//! Amounts above [`MAX_AMOUNT`] and rates above [`MAX_RATE`] are treated as
//! unusable.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Largest money amount accepted from input or storage, in either sign.
pub const MAX_AMOUNT: Decimal = dec!(1000000000000);

/// Largest multiplier or percentage accepted, in either sign.
pub const MAX_RATE: Decimal = dec!(10000);

static AMOUNT_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s$,]").expect("amount pattern is valid"));

/// Parses an optional amount.
///
/// Returns `None` for blank or unparseable text so the caller can treat the
/// field as not populated.
pub fn parse_optional_amount(text: &str) -> Option<Decimal> {
    let cleaned = AMOUNT_NOISE.replace_all(text, "");
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned)
        .ok()
        .filter(|value| value.abs() <= MAX_AMOUNT)
}

/// Parses an amount; blank or unparseable text is zero.
pub fn parse_amount(text: &str) -> Decimal {
    parse_optional_amount(text).unwrap_or(Decimal::ZERO)
}

/// Parses a multiplier or percentage, falling back to `default` when the text
/// is blank, not a number, zero or beyond [`MAX_RATE`].
pub fn parse_rate(
    text: &str,
    default: Decimal,
) -> Decimal {
    match parse_optional_amount(text) {
        Some(value) if !value.is_zero() && value.abs() <= MAX_RATE => value,
        _ => default,
    }
}

/// Parses a whole count such as workers or chargers.
pub fn parse_count(text: &str) -> Option<u32> {
    let cleaned = AMOUNT_NOISE.replace_all(text, "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_optional_amount_strips_currency_formatting() {
        assert_eq!(parse_optional_amount("$1,234.56"), Some(dec!(1234.56)));
        assert_eq!(parse_optional_amount(" 12 "), Some(dec!(12)));
        assert_eq!(parse_optional_amount("-3.5"), Some(dec!(-3.5)));
    }

    #[test]
    fn parse_optional_amount_blank_or_garbage_is_none() {
        assert_eq!(parse_optional_amount(""), None);
        assert_eq!(parse_optional_amount("  "), None);
        assert_eq!(parse_optional_amount("abc"), None);
    }

    #[test]
    fn parse_amount_defaults_to_zero() {
        assert_eq!(parse_amount("n/a"), Decimal::ZERO);
        assert_eq!(parse_amount("$100"), dec!(100));
    }

    #[test]
    fn parse_amount_rejects_values_beyond_limit() {
        assert_eq!(parse_optional_amount("1000000000000"), Some(MAX_AMOUNT));
        assert_eq!(parse_optional_amount("1000000000000.01"), None);
        assert_eq!(parse_amount("1000000000000000000000000000"), Decimal::ZERO);
        assert_eq!(parse_amount("-1000000000000000000000000000"), Decimal::ZERO);
    }

    #[test]
    fn parse_rate_falls_back_to_default() {
        assert_eq!(parse_rate("", dec!(1.0)), dec!(1.0));
        assert_eq!(parse_rate("abc", dec!(30)), dec!(30));
        assert_eq!(parse_rate("0", dec!(8.5)), dec!(8.5));
        assert_eq!(parse_rate("1.25", dec!(1.0)), dec!(1.25));
    }

    #[test]
    fn parse_rate_beyond_limit_uses_default() {
        assert_eq!(parse_rate("10000", dec!(1.0)), dec!(10000));
        assert_eq!(parse_rate("10001", dec!(1.0)), dec!(1.0));
        assert_eq!(parse_rate("-99999", dec!(30)), dec!(30));
    }

    #[test]
    fn parse_rate_keeps_markup_below_one() {
        assert_eq!(parse_rate("0.8", dec!(1.0)), dec!(0.8));
    }

    #[test]
    fn parse_count_reads_whole_numbers() {
        assert_eq!(parse_count("4"), Some(4));
        assert_eq!(parse_count("1,200"), Some(1200));
        assert_eq!(parse_count("2.5"), None);
        assert_eq!(parse_count(""), None);
    }
}
