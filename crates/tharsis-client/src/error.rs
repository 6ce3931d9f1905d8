//! Error types for remote calls.

use std::fmt;

use crate::not_found;

/// Errors returned by a [`ManagedIdentityApi`](crate::ManagedIdentityApi) call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The addressed resource does not exist. Carries the server's message.
    #[error("{message}")]
    NotFound {
        /// Message reported by the server.
        message: String,
    },

    /// The server rejected the request.
    #[error("HTTP {status}: {message}")]
    Remote {
        /// HTTP status code.
        status: u16,
        /// Message reported by the server.
        message: String,
    },

    /// The request never produced a response.
    #[error("Failed to connect to server: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a body this client cannot read.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Description of the problem.
        message: String,
    },
}

impl ApiError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a new `Remote` error.
    #[must_use]
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    /// Creates a new `InvalidResponse` error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Returns `true` if the addressed resource does not exist.
    ///
    /// Besides the structured variant, a `Remote` error whose message reads
    /// `<Kind> with ID <id> not found` also counts (see [`not_found`]).
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Remote { message, .. } => not_found::is_not_found_message(message),
            _ => false,
        }
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        if self.is_not_found() {
            return ErrorCategory::NotFound;
        }
        match self {
            Self::Remote { status, .. } if *status < 500 => ErrorCategory::Rejected,
            Self::Remote { .. } => ErrorCategory::Server,
            Self::Transport(_) => ErrorCategory::Infrastructure,
            Self::InvalidResponse { .. } | Self::NotFound { .. } => ErrorCategory::Protocol,
        }
    }
}

/// Categories of remote errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Resource not found.
    NotFound,
    /// Request rejected by the server (4xx).
    Rejected,
    /// Server failure (5xx).
    Server,
    /// Connection or timeout.
    Infrastructure,
    /// Unreadable response.
    Protocol,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Rejected => write!(f, "rejected"),
            Self::Server => write!(f, "server"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Protocol => write!(f, "protocol"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::not_found("Managed identity with ID mi-1 not found");
        assert_eq!(err.to_string(), "Managed identity with ID mi-1 not found");

        let err = ApiError::remote(400, "name is required");
        assert_eq!(err.to_string(), "HTTP 400: name is required");

        let err = ApiError::invalid_response("missing id");
        assert_eq!(err.to_string(), "Invalid response: missing id");
    }

    #[test]
    fn test_is_not_found() {
        assert!(ApiError::not_found("gone").is_not_found());
        assert!(
            ApiError::remote(
                500,
                "managed identity access rule with ID X not found"
            )
            .is_not_found()
        );
        assert!(!ApiError::remote(500, "database unavailable").is_not_found());
        assert!(!ApiError::invalid_response("not found").is_not_found());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(ApiError::not_found("x").category(), ErrorCategory::NotFound);
        assert_eq!(ApiError::remote(409, "conflict").category(), ErrorCategory::Rejected);
        assert_eq!(ApiError::remote(503, "down").category(), ErrorCategory::Server);
        assert_eq!(ApiError::invalid_response("x").category(), ErrorCategory::Protocol);
    }
}
