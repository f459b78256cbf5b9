//! Event-driven worker services.
//!
//! One service per use case: allocate stock on order creation, complete the
//! allocation on payment acceptance, deallocate (with stock restore) on
//! payment rejection, and apply restock lots. Each processes one validated
//! incoming event end-to-end: read the allocation, apply the transition
//! policy, issue the conditional write, emit the derived event, and absorb
//! guard failures as already-handled races.

pub mod allocate;
pub mod complete;
pub mod deallocate;
pub mod dispatch;
pub mod error;
pub mod restock;

mod emit;


pub use allocate::AllocateWorker;
pub use complete::CompletePaymentWorker;
pub use deallocate::DeallocatePaymentWorker;
pub use dispatch::{BatchDispatcher, BatchResponse, QueueMessage};
pub use error::WorkerError;
pub use restock::RestockWorker;
