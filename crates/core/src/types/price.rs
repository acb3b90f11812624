//! Price formatting helpers.
//!
//! All amounts in the shop are Guatemalan quetzales carried as
//! [`rust_decimal::Decimal`] values in the currency's standard unit. The shop
//! displays whole-quetzal prices ("Q 1,250"), so the formatter rounds to zero
//! decimal places and inserts thousands separators.

use rust_decimal::{Decimal, RoundingStrategy};

/// Format an amount as a quetzal price string, e.g. `Q 1,250`.
#[must_use]
pub fn format_quetzales(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = rounded.abs().to_string();
    let sign = if rounded.is_sign_negative() { "-" } else { "" };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i).is_multiple_of(3) {
            grouped.push(',');
        }
        grouped.push(c);
    }

    format!("Q {sign}{grouped}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_format_small_amount() {
        assert_eq!(format_quetzales(dec("35")), "Q 35");
    }

    #[test]
    fn test_format_rounds_to_whole_quetzales() {
        assert_eq!(format_quetzales(dec("349.50")), "Q 350");
        assert_eq!(format_quetzales(dec("349.49")), "Q 349");
    }

    #[test]
    fn test_format_thousands_separator() {
        assert_eq!(format_quetzales(dec("1250")), "Q 1,250");
        assert_eq!(format_quetzales(dec("1234567")), "Q 1,234,567");
    }

    #[test]
    fn test_format_zero() {
        assert_eq!(format_quetzales(Decimal::ZERO), "Q 0");
    }
}
