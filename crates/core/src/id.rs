//! Strongly-typed identifiers used across the domain.
//!
//! Identifiers arrive from the order system as opaque strings; each newtype
//! validates its shape once at the boundary, so holding a value means it is
//! known-valid everywhere downstream.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of an order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

/// Stock keeping unit identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sku(String);

/// Identifier of the user who placed the order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

/// Identifier of a restock lot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LotId(String);

macro_rules! impl_string_id {
    ($t:ty, $name:literal, $min_len:expr) => {
        impl $t {
            /// Validate and wrap a raw identifier string.
            pub fn parse(raw: impl Into<String>) -> Result<Self, DomainError> {
                let raw = raw.into();
                if raw.trim().is_empty() {
                    return Err(DomainError::invalid_id(concat!($name, " cannot be empty")));
                }
                if raw.len() < $min_len {
                    return Err(DomainError::invalid_id(format!(
                        "{} must be at least {} characters, got {:?}",
                        $name, $min_len, raw
                    )));
                }
                Ok(Self(raw))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

impl_string_id!(OrderId, "OrderId", 4);
impl_string_id!(Sku, "Sku", 4);
impl_string_id!(UserId, "UserId", 4);
impl_string_id!(LotId, "LotId", 1);
