mod in_memory;
mod postgres;
mod r#trait;

pub use in_memory::InMemoryAllocationStore;
pub use postgres::PostgresAllocationStore;
pub use r#trait::{AllocationStore, WriteOutcome};
