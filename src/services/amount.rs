//! Conversion between display decimals and the token's smallest unit

use crate::error::{MarketError, Result};
use ethers::types::U256;
use ethers::utils::parse_units;

/// Decimal places of the stablecoin
pub const TOKEN_DECIMALS: u32 = 18;

/// Decimal places shown to the user
pub const DISPLAY_DECIMALS: u32 = 2;

/// Parse a user-entered decimal amount ("12.5") into smallest-unit integer form.
///
/// Digits beyond the token's precision are truncated.
pub fn to_smallest_unit(input: &str) -> Result<U256> {
    let amount = input.trim();

    if amount.is_empty() {
        return Err(MarketError::InvalidAmount("amount is empty".to_string()));
    }
    if amount.starts_with('-') {
        return Err(MarketError::InvalidAmount(format!(
            "amount must not be negative: {}",
            amount
        )));
    }

    let dots = amount.chars().filter(|c| *c == '.').count();
    let digits = amount.chars().filter(|c| c.is_ascii_digit()).count();
    if dots > 1 || digits == 0 || digits + dots != amount.len() {
        return Err(MarketError::InvalidAmount(format!(
            "not a decimal number: {}",
            amount
        )));
    }

    parse_units(amount, TOKEN_DECIMALS)
        .map(U256::from)
        .map_err(|e| MarketError::InvalidAmount(format!("{}: {}", amount, e)))
}

/// Format a smallest-unit amount with two decimals, rounding half up.
pub fn to_display(amount: U256) -> String {
    let step = U256::exp10((TOKEN_DECIMALS - DISPLAY_DECIMALS) as usize);
    let half = step / 2;
    let hundredths = amount.saturating_add(half) / step;
    let places = U256::exp10(DISPLAY_DECIMALS as usize);

    format!(
        "{}.{:0width$}",
        hundredths / places,
        (hundredths % places).as_u64(),
        width = DISPLAY_DECIMALS as usize
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_price_round_trip() {
        let stored = to_smallest_unit("12.5").unwrap();
        assert_eq!(stored, U256::from_dec_str("12500000000000000000").unwrap());
        assert_eq!(to_display(stored), "12.50");
    }

    #[rstest]
    #[case("0", "0.00")]
    #[case("1", "1.00")]
    #[case("0.1", "0.10")]
    #[case("3.14159", "3.14")]
    #[case("2.675", "2.68")]
    #[case("0.005", "0.01")]
    #[case("0.004999", "0.00")]
    #[case("99.999", "100.00")]
    #[case(" 7.25 ", "7.25")]
    #[case(".5", "0.50")]
    fn test_scaled_then_displayed(#[case] input: &str, #[case] expected: &str) {
        let stored = to_smallest_unit(input).unwrap();
        assert_eq!(to_display(stored), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("-1")]
    #[case("abc")]
    #[case("1.2.3")]
    #[case(".")]
    #[case("1e18")]
    fn test_rejects_invalid_amounts(#[case] input: &str) {
        assert!(matches!(
            to_smallest_unit(input),
            Err(MarketError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_display_of_raw_balances() {
        assert_eq!(to_display(U256::zero()), "0.00");
        assert_eq!(to_display(U256::from(4_999_999_999_999_999u64)), "0.00");
        assert_eq!(to_display(U256::from(5_000_000_000_000_000u64)), "0.01");
        assert_eq!(
            to_display(U256::from_dec_str("123456780000000000000000").unwrap()),
            "123456.78"
        );
    }

    #[test]
    fn test_display_does_not_overflow_at_max() {
        let shown = to_display(U256::MAX);
        assert!(shown.contains('.'));
    }
}
