use thiserror::Error;

/// Infrastructure fault raised by a store implementation.
///
/// Guard failures and capacity rejections are *not* errors; they are explicit
/// write outcomes. Anything surfacing here is an unknown/transient fault the
/// caller should retry.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage fault in {operation}: {message}")]
    Backend { operation: String, message: String },
}

impl StoreError {
    pub fn backend(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    StoreError::backend(operation, err.to_string())
}
