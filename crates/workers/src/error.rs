use thiserror::Error;

use stockflow_core::DomainError;
use stockflow_store::StoreError;

/// Worker-level error, classified for the redelivery mechanism.
///
/// Only `Unrecognized` is transient: redelivering the message may succeed.
/// Everything else is either bad input or a race that has already been
/// resolved, so redelivery would be pointless.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Malformed input; redelivery would not help.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The event log's uniqueness guard tripped; the derived event was
    /// already persisted. Absorbed internally in normal operation.
    #[error("duplicate event raised: {0}")]
    DuplicateEventRaised(String),

    /// The completion conditional write lost its guard; another delivery
    /// already completed the allocation. Absorbed internally.
    #[error("invalid stock completion: {0}")]
    InvalidStockCompletion(String),

    /// The deallocation conditional write lost its guard; another delivery
    /// already deallocated. Absorbed internally.
    #[error("invalid stock deallocation: {0}")]
    InvalidStockDeallocation(String),

    /// Unknown/infra fault; the caller should retry.
    #[error("unrecognized error: {0}")]
    Unrecognized(String),
}

impl WorkerError {
    /// Whether redelivering the triggering message may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unrecognized(_))
    }
}

impl From<StoreError> for WorkerError {
    fn from(err: StoreError) -> Self {
        Self::Unrecognized(err.to_string())
    }
}

impl From<DomainError> for WorkerError {
    fn from(err: DomainError) -> Self {
        Self::InvalidArguments(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unrecognized_is_transient() {
        assert!(!WorkerError::InvalidArguments("x".into()).is_transient());
        assert!(!WorkerError::DuplicateEventRaised("x".into()).is_transient());
        assert!(!WorkerError::InvalidStockCompletion("x".into()).is_transient());
        assert!(!WorkerError::InvalidStockDeallocation("x".into()).is_transient());
        assert!(WorkerError::Unrecognized("x".into()).is_transient());
    }

    #[test]
    fn store_faults_classify_as_transient() {
        let err: WorkerError = StoreError::backend("get", "connection refused").into();
        assert!(err.is_transient());
    }
}
