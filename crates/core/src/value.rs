//! Validated quantity and money value objects.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A positive number of stock units.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Units(i64);

impl Units {
    pub fn parse(raw: i64) -> Result<Self, DomainError> {
        if raw <= 0 {
            return Err(DomainError::validation(format!(
                "units must be positive, got {raw}"
            )));
        }
        Ok(Self(raw))
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for Units {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A non-negative unit price.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    pub fn parse(raw: Decimal) -> Result<Self, DomainError> {
        if raw.is_sign_negative() {
            return Err(DomainError::validation(format!(
                "price cannot be negative, got {raw}"
            )));
        }
        Ok(Self(raw))
    }

    pub fn get(&self) -> Decimal {
        self.0
    }
}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn units_must_be_positive() {
        assert!(Units::parse(1).is_ok());
        assert!(Units::parse(0).is_err());
        assert!(Units::parse(-3).is_err());
    }

    #[test]
    fn price_allows_zero_but_not_negative() {
        assert!(Price::parse(Decimal::ZERO).is_ok());
        assert!(Price::parse(Decimal::new(-1, 2)).is_err());
    }
}
