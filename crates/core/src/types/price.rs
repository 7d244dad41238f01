//! Type-safe price representation using decimal arithmetic.
//!
//! All storefront amounts are in South African rand. `Price` pairs an amount
//! with its currency so display formatting lives in one place.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (rand, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a rand price.
    #[must_use]
    pub const fn zar(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::ZAR)
    }

    /// Format for display, e.g. `R1 299` or `R95.50`.
    ///
    /// Thousands are separated with a space (South African convention) and
    /// cents are only shown when non-zero.
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self.amount.round_dp(2);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let abs = rounded.abs();
        let whole = abs.trunc();
        let cents = ((abs - whole) * Decimal::ONE_HUNDRED).trunc().normalize();

        let digits = whole.normalize().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(' ');
            }
            grouped.push(ch);
        }

        let sign = if negative { "-" } else { "" };
        let symbol = self.currency_code.symbol();
        if cents.is_zero() {
            format!("{sign}{symbol}{grouped}")
        } else {
            let cents = cents.to_string();
            format!("{sign}{symbol}{grouped}.{cents:0>2}")
        }
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    ZAR,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::ZAR => "R",
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_whole_rand() {
        assert_eq!(Price::zar(Decimal::new(1299, 0)).display(), "R1 299");
        assert_eq!(Price::zar(Decimal::new(95, 0)).display(), "R95");
        assert_eq!(Price::zar(Decimal::new(1_234_567, 0)).display(), "R1 234 567");
    }

    #[test]
    fn test_display_with_cents() {
        assert_eq!(Price::zar(Decimal::new(12995, 2)).display(), "R129.95");
        assert_eq!(Price::zar(Decimal::new(9505, 2)).display(), "R95.05");
    }

    #[test]
    fn test_display_zero_and_negative() {
        assert_eq!(Price::zar(Decimal::ZERO).display(), "R0");
        assert_eq!(Price::zar(Decimal::new(-150, 0)).display(), "-R150");
    }

    #[test]
    fn test_default_currency_is_rand() {
        assert_eq!(CurrencyCode::default(), CurrencyCode::ZAR);
    }
}
