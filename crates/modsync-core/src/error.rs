//! Platform and store error types.

use thiserror::Error;

/// Errors reported by the platform facade.
///
/// `NotImplemented` is the "value unavailable" signal: callers degrade
/// the affected attribute to a placeholder instead of aborting.
#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    /// The platform does not implement this capability.
    #[error("platform capability not implemented")]
    NotImplemented,

    /// The referenced unit index does not exist.
    #[error("no unit at index {0}")]
    NoSuchUnit(usize),

    /// The platform rejected or failed the operation.
    #[error("platform operation failed: {0}")]
    Failed(String),
}

/// Errors reported by the shared store client.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The store connection is gone.
    #[error("store disconnected: {0}")]
    Disconnected(String),

    /// A single table operation failed.
    #[error("table operation failed: {0}")]
    Operation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_error_display() {
        assert_eq!(
            PlatformError::NotImplemented.to_string(),
            "platform capability not implemented"
        );
        assert_eq!(PlatformError::NoSuchUnit(3).to_string(), "no unit at index 3");
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Operation("set failed".to_string());
        assert_eq!(err.to_string(), "table operation failed: set failed");
    }
}
