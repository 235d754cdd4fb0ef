//! Resource error types.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while talking to a remote resource.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResourceError {
    /// Request never reached the server (offline, DNS, connection refused).
    #[error("network error: {0}")]
    Network(String),

    /// No response arrived before the configured deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Server answered with a failure and no usable validation message.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Server rejected the payload with a human-readable reason.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The targeted record no longer exists on the server.
    #[error("not found: {0}")]
    NotFound(String),

    /// Response body could not be decoded into the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// The owning view was torn down before the call completed.
    #[error("operation cancelled")]
    Cancelled,
}

impl ResourceError {
    /// Error kind as seen by the view layer.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResourceError::Network(_) | ResourceError::Timeout(_) => ErrorKind::Network,
            ResourceError::Server { status, .. } => ErrorKind::Server { status: *status },
            ResourceError::Decode(_) => ErrorKind::Server { status: 200 },
            ResourceError::Validation(_) => ErrorKind::Validation,
            ResourceError::NotFound(_) => ErrorKind::NotFound,
            ResourceError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Whether a retry could plausibly succeed without user action.
    pub fn is_transient(&self) -> bool {
        match self {
            ResourceError::Network(_) | ResourceError::Timeout(_) => true,
            ResourceError::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Result type for resource operations.
pub type Result<T> = std::result::Result<T, ResourceError>;

/// Coarse error taxonomy surfaced to views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Server { status: u16 },
    Validation,
    NotFound,
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Network => write!(f, "network"),
            ErrorKind::Server { status } => write!(f, "server ({})", status),
            ErrorKind::Validation => write!(f, "validation"),
            ErrorKind::NotFound => write!(f, "not found"),
            ErrorKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Error details a view can show as-is.
///
/// `message` is never empty: when the server supplied no text, a generic
/// sentence for the kind is used instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            default_message(kind).to_string()
        } else {
            message
        };
        Self { kind, message }
    }
}

impl From<&ResourceError> for ErrorInfo {
    fn from(err: &ResourceError) -> Self {
        let kind = err.kind();
        let message = match err {
            ResourceError::Validation(msg) => msg.clone(),
            ResourceError::Server { message, status } if *status < 500 => message.clone(),
            ResourceError::Timeout(_) => {
                "The server took too long to respond. Please try again.".to_string()
            }
            _ => String::new(),
        };
        ErrorInfo::new(kind, message)
    }
}

impl From<ResourceError> for ErrorInfo {
    fn from(err: ResourceError) -> Self {
        ErrorInfo::from(&err)
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

fn default_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Network => "Could not reach the server. Check your connection and try again.",
        ErrorKind::Server { .. } => "The server could not complete the request. Please try again later.",
        ErrorKind::Validation => "The submitted data was rejected. Please review the form and try again.",
        ErrorKind::NotFound => "This record no longer exists. Refresh the list to see the latest data.",
        ErrorKind::Cancelled => "The operation was cancelled.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_is_passed_through() {
        let err = ResourceError::Validation("Name already exists".to_string());
        let info = ErrorInfo::from(&err);
        assert_eq!(info.kind, ErrorKind::Validation);
        assert_eq!(info.message, "Name already exists");
    }

    #[test]
    fn test_empty_messages_fall_back_to_kind_default() {
        let err = ResourceError::Validation("   ".to_string());
        let info = ErrorInfo::from(&err);
        assert!(info.message.contains("rejected"));

        let info = ErrorInfo::from(&ResourceError::Network("connection refused".to_string()));
        assert_eq!(info.kind, ErrorKind::Network);
        assert!(info.message.contains("Could not reach the server"));
    }

    #[test]
    fn test_internal_server_text_is_not_shown() {
        let err = ResourceError::Server {
            status: 500,
            message: "panicked at src/db.rs:42".to_string(),
        };
        let info = ErrorInfo::from(&err);
        assert_eq!(info.kind, ErrorKind::Server { status: 500 });
        assert!(!info.message.contains("panicked"));
    }

    #[test]
    fn test_timeout_is_network_kind() {
        let err = ResourceError::Timeout(Duration::from_secs(5));
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(err.is_transient());
        assert!(ErrorInfo::from(&err).message.contains("too long"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(ResourceError::Network("dns".into()).is_transient());
        assert!(
            ResourceError::Server {
                status: 503,
                message: String::new()
            }
            .is_transient()
        );
        assert!(
            !ResourceError::Server {
                status: 409,
                message: String::new()
            }
            .is_transient()
        );
        assert!(!ResourceError::Validation("bad".into()).is_transient());
        assert!(!ResourceError::NotFound("7".into()).is_transient());
        assert!(!ResourceError::Cancelled.is_transient());
    }
}
