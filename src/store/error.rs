//! Storage Errors
//!
//! `TigerStyle`: Explicit error types with context.

use thiserror::Error;

use super::entity::EntityKind;

/// Errors from storage operations.
///
/// Absent entities are not errors: `get` returns `Ok(None)` so callers can
/// decide how to respond. `NotFound` here only signals a write against a key
/// that no longer exists.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// An entity is already registered under this composite key
    #[error("entity already exists: {key}")]
    AlreadyExists {
        /// Composite `<Kind>.<id>` key that collided
        key: String,
    },

    /// A foreign-key field points at an entity that is not live
    #[error("referenced {kind} does not exist: {id}")]
    MissingReference {
        /// Kind of the referenced entity
        kind: EntityKind,
        /// Id that failed to resolve
        id: String,
    },

    /// Write-back against a key that is not live
    #[error("entity not found: {key}")]
    NotFound {
        /// Composite `<Kind>.<id>` key that was absent
        key: String,
    },

    /// Durable flush could not complete
    #[error("write failed: {message}")]
    WriteFailed {
        /// Underlying I/O error message
        message: String,
    },

    /// Durable state could not be read
    #[error("read failed: {message}")]
    ReadFailed {
        /// Underlying I/O error message
        message: String,
    },

    /// The object graph could not be serialized
    #[error("serialization error: {message}")]
    Serialization {
        /// Underlying serializer error message
        message: String,
    },
}

impl StoreError {
    /// Create an already exists error.
    #[must_use]
    pub fn already_exists(key: impl Into<String>) -> Self {
        Self::AlreadyExists { key: key.into() }
    }

    /// Create a missing reference error.
    #[must_use]
    pub fn missing_reference(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::MissingReference {
            kind,
            id: id.into(),
        }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a write failure error.
    #[must_use]
    pub fn write_failed(message: impl Into<String>) -> Self {
        Self::WriteFailed {
            message: message.into(),
        }
    }

    /// Create a read failure error.
    #[must_use]
    pub fn read_failed(message: impl Into<String>) -> Self {
        Self::ReadFailed {
            message: message.into(),
        }
    }

    /// Create a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Check if this error is a not-found condition from the caller's view.
    ///
    /// Both a dangling foreign key and a write against a dead key resolve to
    /// "the referenced thing is gone".
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::MissingReference { .. } | Self::NotFound { .. })
    }
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_constructors() {
        let err = StoreError::already_exists("State.abc");
        assert!(matches!(err, StoreError::AlreadyExists { key } if key == "State.abc"));

        let err = StoreError::missing_reference(EntityKind::User, "u-1");
        assert!(
            matches!(err, StoreError::MissingReference { kind, id } if kind == EntityKind::User && id == "u-1")
        );

        let err = StoreError::write_failed("disk full");
        assert_eq!(err.to_string(), "write failed: disk full");
    }

    #[test]
    fn test_is_not_found() {
        assert!(StoreError::missing_reference(EntityKind::Place, "p-1").is_not_found());
        assert!(StoreError::not_found("Review.r-1").is_not_found());

        assert!(!StoreError::already_exists("State.abc").is_not_found());
        assert!(!StoreError::write_failed("disk full").is_not_found());
    }
}
