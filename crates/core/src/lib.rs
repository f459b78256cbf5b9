//! Shared domain primitives: validated identifiers, quantities, errors.

pub mod error;
pub mod id;
pub mod value;

pub use error::{DomainError, DomainResult};
pub use id::{LotId, OrderId, Sku, UserId};
pub use value::{Price, Units};
