//! Error types for activation and authorisation operations.
//!
//! The taxonomy deliberately folds "never existed", "expired" and "wrong
//! secret" into a single `NotFound` so callers cannot distinguish which of
//! the three occurred.

use std::fmt;

/// Errors that can occur during activation and authorisation operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The input is malformed or a required field is missing. No state change.
    #[error("Validation error: {message}")]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    /// No matching or valid record. Covers unknown subjects, expired
    /// activations and wrong secrets alike.
    #[error("Not found: {message}")]
    NotFound {
        /// Description reported to the caller.
        message: String,
    },

    /// The caller is known but not permitted to perform the operation.
    #[error("Permission denied: {message}")]
    PermissionDenied {
        /// Description of why permission was denied.
        message: String,
    },

    /// A record with the same unique identifier already exists.
    #[error("Conflict: {message}")]
    Conflict {
        /// Description of the conflicting resource.
        message: String,
    },

    /// A required external collaborator is unreachable.
    #[error("Service unavailable: {message}")]
    ServiceUnavailable {
        /// Description of the unavailable service.
        message: String,
    },

    /// An error occurred while storing or retrieving data.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// The configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `Validation` error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a new `PermissionDenied` error.
    #[must_use]
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Creates a new `Conflict` error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a new `ServiceUnavailable` error.
    #[must_use]
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::NotFound { .. }
                | Self::PermissionDenied { .. }
                | Self::Conflict { .. }
        )
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::ServiceUnavailable { .. }
                | Self::Storage { .. }
                | Self::Configuration { .. }
                | Self::Internal { .. }
        )
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::PermissionDenied { .. } => ErrorCategory::Permission,
            Self::Conflict { .. } => ErrorCategory::Conflict,
            Self::ServiceUnavailable { .. } => ErrorCategory::Availability,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Request validation errors.
    Validation,
    /// Missing or invalid records.
    NotFound,
    /// Authorisation/permission errors.
    Permission,
    /// Duplicate-resource conflicts.
    Conflict,
    /// Unavailable external collaborators.
    Availability,
    /// Infrastructure/storage errors.
    Infrastructure,
    /// Configuration errors.
    Configuration,
    /// Internal server errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::NotFound => write!(f, "not_found"),
            Self::Permission => write!(f, "permission"),
            Self::Conflict => write!(f, "conflict"),
            Self::Availability => write!(f, "availability"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::not_found("could not find relevant activation");
        assert_eq!(
            err.to_string(),
            "Not found: could not find relevant activation"
        );

        let err = AuthError::permission_denied("clinician is not active");
        assert_eq!(
            err.to_string(),
            "Permission denied: clinician is not active"
        );

        let err = AuthError::conflict("clinician already present");
        assert_eq!(err.to_string(), "Conflict: clinician already present");
    }

    #[test]
    fn test_error_predicates() {
        assert!(AuthError::validation("bad input").is_client_error());
        assert!(AuthError::not_found("missing").is_client_error());
        assert!(!AuthError::not_found("missing").is_server_error());

        assert!(AuthError::service_unavailable("cache down").is_server_error());
        assert!(AuthError::storage("db down").is_server_error());
        assert!(!AuthError::storage("db down").is_client_error());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            AuthError::validation("test").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            AuthError::permission_denied("test").category(),
            ErrorCategory::Permission
        );
        assert_eq!(
            AuthError::service_unavailable("test").category(),
            ErrorCategory::Availability
        );
        assert_eq!(ErrorCategory::NotFound.to_string(), "not_found");
    }
}
