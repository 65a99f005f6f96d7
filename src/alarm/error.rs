//! Alarm store error types.
//!
//! Unknown ids are not errors; store operations report them as `Ok(false)`.
//! Storage failures never roll back the in-memory collection.

use std::io;

use thiserror::Error;

/// Errors that can occur in the alarm store.
#[derive(Debug, Error)]
pub enum AlarmError {
    /// Writing or syncing the alarm document failed.
    #[error("failed to persist alarm document: {0}")]
    Storage(#[source] io::Error),

    /// The collection could not be serialized.
    #[error("failed to serialize alarm document: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The alarm failed range validation.
    #[error("invalid alarm: {0}")]
    InvalidAlarm(String),

    /// An alarm with the same id already exists.
    #[error("alarm id already exists: {0}")]
    DuplicateId(String),
}

impl AlarmError {
    /// Returns true if the failure is a durability problem only.
    ///
    /// In that case the in-memory mutation has already been applied.
    #[must_use]
    pub fn is_storage_error(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Serialize(_))
    }

    /// Returns true if the request itself was rejected.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::InvalidAlarm(_) | Self::DuplicateId(_))
    }
}

/// Result type for alarm store operations.
pub type Result<T> = std::result::Result<T, AlarmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AlarmError::Storage(io::Error::other("disk full"));
        assert!(err.to_string().contains("disk full"));

        let err = AlarmError::InvalidAlarm("hour must be in 0-23, got 25".to_string());
        assert!(err.to_string().contains("hour must be"));

        let err = AlarmError::DuplicateId("a1".to_string());
        assert!(err.to_string().contains("a1"));
    }

    #[test]
    fn test_classification() {
        let storage = AlarmError::Storage(io::Error::other("x"));
        assert!(storage.is_storage_error());
        assert!(!storage.is_rejected());

        let invalid = AlarmError::InvalidAlarm("x".into());
        assert!(invalid.is_rejected());
        assert!(!invalid.is_storage_error());

        assert!(AlarmError::DuplicateId("x".into()).is_rejected());
    }
}
