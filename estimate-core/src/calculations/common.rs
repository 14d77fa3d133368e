//! Money helpers shared by the stage and pricing calculations.
//!
//! Percentages are always applied to whole cents: the base amount is rounded
//! to an integer number of cents, the percentage is applied to that count and
//! the share is rounded back to a whole cent. This keeps repeated
//! percentage-of-amount operations free of fractional-cent drift.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use estimate_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts an amount to an integer number of cents, rounding half away from zero.
pub fn to_cents(amount: Decimal) -> i128 {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .mantissa()
}

/// Converts an integer number of cents back to a two-place amount.
pub fn from_cents(cents: i128) -> Decimal {
    Decimal::from_i128_with_scale(cents, 2)
}

/// Returns `percentage`% of `amount`, computed on whole cents.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use estimate_core::calculations::common::percentage_of;
///
/// assert_eq!(percentage_of(dec!(2900), dec!(8.5)), dec!(246.50));
/// assert_eq!(percentage_of(dec!(0.10), dec!(50)), dec!(0.05));
/// ```
pub fn percentage_of(
    amount: Decimal,
    percentage: Decimal,
) -> Decimal {
    let share = Decimal::from_i128_with_scale(to_cents(amount), 0) * percentage
        / Decimal::ONE_HUNDRED;
    from_cents(
        share
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .mantissa(),
    )
}

/// Returns `amount` plus `percentage`% of it, computed on whole cents.
pub fn add_percentage(
    amount: Decimal,
    percentage: Decimal,
) -> Decimal {
    from_cents(to_cents(amount) + to_cents(percentage_of(amount, percentage)))
}

/// Splits `amount` evenly across `count` units, rounded to the cent.
///
/// A zero count yields zero rather than an error.
pub fn per_unit(
    amount: Decimal,
    count: u32,
) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    round_half_up(amount / Decimal::from(count))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // round_half_up tests
    // =========================================================================

    #[test]
    fn round_half_up_rounds_up_at_midpoint() {
        assert_eq!(round_half_up(dec!(629.305)), dec!(629.31));
    }

    #[test]
    fn round_half_up_rounds_down_below_midpoint() {
        assert_eq!(round_half_up(dec!(629.304)), dec!(629.30));
    }

    #[test]
    fn round_half_up_handles_negative_values() {
        assert_eq!(round_half_up(dec!(-10.005)), dec!(-10.01));
    }

    // =========================================================================
    // cent conversion tests
    // =========================================================================

    #[test]
    fn to_cents_rounds_fractional_cents() {
        assert_eq!(to_cents(dec!(12.345)), 1235);
        assert_eq!(to_cents(dec!(12.344)), 1234);
        assert_eq!(to_cents(dec!(1000)), 100000);
    }

    #[test]
    fn to_cents_handles_negative_amounts() {
        assert_eq!(to_cents(dec!(-0.015)), -2);
    }

    #[test]
    fn from_cents_keeps_two_places() {
        assert_eq!(from_cents(24650), dec!(246.50));
        assert_eq!(from_cents(24650).scale(), 2);
    }

    // =========================================================================
    // percentage_of tests
    // =========================================================================

    #[test]
    fn percentage_of_overhead_default() {
        assert_eq!(percentage_of(dec!(2900.00), dec!(8.5)), dec!(246.50));
    }

    #[test]
    fn percentage_of_rounds_share_to_cent() {
        // 3333 cents * 30% = 999.9 cents
        assert_eq!(percentage_of(dec!(33.33), dec!(30)), dec!(10.00));
    }

    #[test]
    fn percentage_of_rounds_base_before_applying() {
        // 10.005 rounds to 1001 cents first; 1001 * 10% = 100.1 cents
        assert_eq!(percentage_of(dec!(10.005), dec!(10)), dec!(1.00));
    }

    #[test]
    fn percentage_of_zero_percentage_is_zero() {
        assert_eq!(percentage_of(dec!(5000), dec!(0)), dec!(0.00));
    }

    #[test]
    fn percentage_of_negative_base() {
        assert_eq!(percentage_of(dec!(-100), dec!(30)), dec!(-30.00));
    }

    #[test]
    fn percentage_of_avoids_binary_float_drift() {
        // 0.1 + 0.2 style inputs stay exact
        assert_eq!(percentage_of(dec!(0.30), dec!(100)), dec!(0.30));
        assert_eq!(percentage_of(dec!(19.99), dec!(7.25)), dec!(1.45));
    }

    // =========================================================================
    // add_percentage tests
    // =========================================================================

    #[test]
    fn add_percentage_adds_sales_tax() {
        assert_eq!(add_percentage(dec!(1000), dec!(8.25)), dec!(1082.50));
    }

    #[test]
    fn add_percentage_zero_keeps_amount() {
        assert_eq!(add_percentage(dec!(123.45), dec!(0)), dec!(123.45));
    }

    // =========================================================================
    // per_unit tests
    // =========================================================================

    #[test]
    fn per_unit_divides_and_rounds() {
        assert_eq!(per_unit(dec!(3146.50), 5), dec!(629.30));
        assert_eq!(per_unit(dec!(100), 3), dec!(33.33));
    }

    #[test]
    fn per_unit_zero_count_is_zero() {
        assert_eq!(per_unit(dec!(3146.50), 0), Decimal::ZERO);
    }
}
