//! Storage layer: conditional allocation store and insert-only event log.
//!
//! Conditional-write results are explicit variants (`Written`, `GuardFailed`,
//! `CapacityExceeded`), so callers match on the outcome instead of catching
//! exceptions; infrastructure faults are the only `Err`.

pub mod allocation_store;
pub mod config;
pub mod error;
pub mod event_store;

pub use allocation_store::{AllocationStore, InMemoryAllocationStore, PostgresAllocationStore, WriteOutcome};
pub use config::{ensure_schema, StoreConfig};
pub use error::StoreError;
pub use event_store::{AppendOutcome, EventStore, InMemoryEventStore, PostgresEventStore};
