use std::fmt;

use tharsis_client::ApiError;
use tharsis_core::{CoreError, ErrorCategory as CoreErrorCategory};
use thiserror::Error;

/// Errors surfaced by the reconcilers
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Desired credentials do not satisfy the identity type. No remote call was made.
    #[error("invalid managed identity credentials: {0}")]
    Validation(#[source] CoreError),

    /// Valid credentials could not be serialized into a payload.
    #[error("encoding managed identity payload: {0}")]
    Encode(#[source] CoreError),

    /// The remote payload could not be decoded.
    #[error("decoding payload of managed identity {id}: {source}")]
    Decode {
        id: String,
        #[source]
        source: CoreError,
    },

    /// A remote call failed.
    #[error("{operation}: {source}")]
    Remote {
        operation: &'static str,
        #[source]
        source: ApiError,
    },

    /// The identity exists remotely but its access rules could not be read back.
    #[error("managed identity {id} was created but fetching its access rules failed: {source}")]
    CreatedWithoutAccessRules {
        id: String,
        #[source]
        source: ApiError,
    },

    /// The remote returned an access rule that points at another identity.
    #[error("access rule {rule_id} belongs to managed identity {actual}, expected {expected}")]
    ForeignAccessRule {
        rule_id: String,
        expected: String,
        actual: String,
    },
}

impl ReconcileError {
    pub fn remote(operation: &'static str, source: ApiError) -> Self {
        Self::Remote { operation, source }
    }

    pub fn decode(id: impl Into<String>, source: CoreError) -> Self {
        Self::Decode {
            id: id.into(),
            source,
        }
    }

    /// Wraps a failure to turn desired credentials into a payload. Only
    /// rejected input counts as `Validation`.
    pub fn credentials(source: CoreError) -> Self {
        match source.category() {
            CoreErrorCategory::Validation => Self::Validation(source),
            CoreErrorCategory::Decode | CoreErrorCategory::Serialization => Self::Encode(source),
        }
    }

    /// `true` when the remote parent exists even though the operation failed.
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::CreatedWithoutAccessRules { .. })
    }

    /// Id of a managed identity left behind by a partially failed create.
    pub fn created_id(&self) -> Option<&str> {
        match self {
            Self::CreatedWithoutAccessRules { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Encode(_) => ErrorCategory::Internal,
            Self::Decode { .. } | Self::ForeignAccessRule { .. } => ErrorCategory::StateMismatch,
            Self::Remote { .. } => ErrorCategory::Remote,
            Self::CreatedWithoutAccessRules { .. } => ErrorCategory::Partial,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    StateMismatch,
    Remote,
    Partial,
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::StateMismatch => write!(f, "state_mismatch"),
            Self::Remote => write!(f, "remote"),
            Self::Partial => write!(f, "partial"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_carries_operation_label() {
        let err = ReconcileError::remote(
            "creating managed identity",
            ApiError::remote(400, "name is invalid"),
        );
        assert_eq!(
            err.to_string(),
            "creating managed identity: HTTP 400: name is invalid"
        );
        assert_eq!(err.category(), ErrorCategory::Remote);
        assert!(!err.is_partial());
    }

    #[test]
    fn test_partial_create_is_distinct() {
        let err = ReconcileError::CreatedWithoutAccessRules {
            id: "mi-1".to_string(),
            source: ApiError::remote(503, "unavailable"),
        };
        assert!(err.is_partial());
        assert_eq!(err.created_id(), Some("mi-1"));
        assert_eq!(err.category().to_string(), "partial");
        assert!(err.to_string().starts_with("managed identity mi-1 was created"));
    }

    #[test]
    fn test_validation_error_display() {
        let err = ReconcileError::Validation(CoreError::validation(
            "role",
            "role is required for aws_federated managed identities",
        ));
        assert_eq!(
            err.to_string(),
            "invalid managed identity credentials: role is required for aws_federated managed identities"
        );
    }

    #[test]
    fn test_credentials_error_separates_bad_input_from_encoding() {
        let err = ReconcileError::credentials(CoreError::validation("role", "role is required"));
        assert!(matches!(err, ReconcileError::Validation(_)));
        assert_eq!(err.category(), ErrorCategory::Validation);

        let err = ReconcileError::credentials(CoreError::unsupported_type("gcp_federated"));
        assert!(matches!(err, ReconcileError::Validation(_)));

        let json_err = serde_json::from_str::<u8>("not json").unwrap_err();
        let err = ReconcileError::credentials(CoreError::from(json_err));
        assert!(matches!(err, ReconcileError::Encode(_)));
        assert_eq!(err.category(), ErrorCategory::Internal);
        assert!(err.to_string().starts_with("encoding managed identity payload:"));
    }
}
