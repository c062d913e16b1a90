//! Catalog prices using decimal arithmetic.
//!
//! Prices are parsed from the catalog's `price_(USD)` column, so parsing is
//! strict: at most two decimal places and never negative.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    #[error("price cannot be empty")]
    Empty,
    #[error("price is not a number: {0}")]
    Invalid(String),
    #[error("price cannot be negative: {0}")]
    Negative(String),
    #[error("price has more than two decimal places: {0}")]
    TooPrecise(String),
}

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (dollars, not cents).
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

    /// Create a USD price.
    #[must_use]
    pub const fn usd(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::USD)
    }

    /// A zero USD price, the starting point for order totals.
    #[must_use]
    pub const fn zero_usd() -> Self {
        Self::usd(Decimal::ZERO)
    }

    /// Parse a USD amount such as `0.60`, `$5.86` or `2`.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError`] for blank, non-numeric, negative, or
    /// over-precise input.
    pub fn parse_usd(input: &str) -> Result<Self, PriceError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(PriceError::Empty);
        }
        let digits = trimmed.strip_prefix('$').unwrap_or(trimmed);

        let amount =
            Decimal::from_str(digits).map_err(|_| PriceError::Invalid(trimmed.to_owned()))?;
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(trimmed.to_owned()));
        }
        if amount.normalize().scale() > 2 {
            return Err(PriceError::TooPrecise(trimmed.to_owned()));
        }

        Ok(Self::usd(amount))
    }

    /// Add two prices of the same currency. Returns `None` on a currency
    /// mismatch or overflow.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        if self.currency_code != other.currency_code {
            return None;
        }
        self.amount
            .checked_add(other.amount)
            .map(|amount| Self::new(amount, self.currency_code))
    }

    /// Format for display (e.g., "$5.86").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency_code.symbol(), self.amount)
    }

    /// The amount as a plain two-decimal string (e.g., "5.86"), the form
    /// written to the catalog CSV.
    #[must_use]
    pub fn plain(&self) -> String {
        format!("{:.2}", self.amount)
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
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }
}
