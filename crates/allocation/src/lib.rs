//! Order-allocation aggregate, transition commands and decision policy.

pub mod allocation;
pub mod command;
pub mod policy;

pub use allocation::{AllocationStatus, OrderAllocation};
pub use command::AllocationTransition;
pub use policy::{CreateDecision, TransitionDecision};
