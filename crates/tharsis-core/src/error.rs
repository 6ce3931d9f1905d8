use thiserror::Error;

/// Core error types for managed identity records and credential payloads
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    #[error("Unsupported managed identity type: {0}")]
    UnsupportedType(String),

    #[error("Malformed managed identity payload: {0}")]
    Decode(String),

    #[error("Failed to serialize managed identity payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Invalid run stage: {0}")]
    InvalidRunStage(String),
}

impl CoreError {
    /// Create a new Validation error naming the offending field
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Create a new UnsupportedType error
    pub fn unsupported_type(kind: impl Into<String>) -> Self {
        Self::UnsupportedType(kind.into())
    }

    /// Create a new Decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Create a new InvalidRunStage error
    pub fn invalid_run_stage(stage: impl Into<String>) -> Self {
        Self::InvalidRunStage(stage.into())
    }

    /// The field a validation error refers to, if any
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } | Self::UnsupportedType(_) | Self::InvalidRunStage(_) => {
                ErrorCategory::Validation
            }
            Self::Decode(_) => ErrorCategory::Decode,
            Self::Encode(_) => ErrorCategory::Serialization,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Decode,
    Serialization,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Decode => write!(f, "decode"),
            Self::Serialization => write!(f, "serialization"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_names_field() {
        let err = CoreError::validation("role", "role is required for aws_federated managed identities");
        assert_eq!(
            err.to_string(),
            "role is required for aws_federated managed identities"
        );
        assert_eq!(err.field(), Some("role"));
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_unsupported_type_error() {
        let err = CoreError::unsupported_type("gcp_federated");
        assert_eq!(
            err.to_string(),
            "Unsupported managed identity type: gcp_federated"
        );
        assert_eq!(err.field(), None);
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_decode_error_category() {
        let err = CoreError::decode("invalid base64");
        assert_eq!(err.category(), ErrorCategory::Decode);
        assert_eq!(err.category().to_string(), "decode");
    }
}
