//! Error types for finflow-core
//!
//! Every failure the dashboard can meet is scoped to the interaction that
//! triggered it. Errors carry a stable code and a severity so handlers can
//! decide between redirecting, logging quietly, or showing the user a message.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// No session, or the provider rejected the token
    Unauthenticated,
    /// The auth provider could not be reached or failed
    AuthUnavailable,
    /// The auth provider refused a sign-in or sign-up
    AuthRejected,
    /// Transport-level failure talking to a remote service
    Transport,
    /// A remote service answered with something we could not decode
    InvalidResponse,
    /// The transaction source answered with a non-success status
    FetchFailed,
    /// The upload endpoint answered with a non-success status
    UploadRejected,
    /// File name does not match the accepted statement types
    UnsupportedFileType,
    /// File is larger than the configured limit
    FileTooLarge,
    /// Another upload for the same user is still running
    UploadInProgress,
    /// Request input failed validation
    ValidationError,
    /// The operation was cancelled by its view
    Cancelled,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::Unauthenticated => write!(f, "UNAUTHENTICATED"),
            ErrorCode::AuthUnavailable => write!(f, "AUTH_UNAVAILABLE"),
            ErrorCode::AuthRejected => write!(f, "AUTH_REJECTED"),
            ErrorCode::Transport => write!(f, "TRANSPORT"),
            ErrorCode::InvalidResponse => write!(f, "INVALID_RESPONSE"),
            ErrorCode::FetchFailed => write!(f, "FETCH_FAILED"),
            ErrorCode::UploadRejected => write!(f, "UPLOAD_REJECTED"),
            ErrorCode::UnsupportedFileType => write!(f, "UNSUPPORTED_FILE_TYPE"),
            ErrorCode::FileTooLarge => write!(f, "FILE_TOO_LARGE"),
            ErrorCode::UploadInProgress => write!(f, "UPLOAD_IN_PROGRESS"),
            ErrorCode::ValidationError => write!(f, "VALIDATION_ERROR"),
            ErrorCode::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Suggestions for resolution
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
        }
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, "\nDetails: {}", details)?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Expected during normal use
    Debug,
    /// Informational
    Info,
    /// Warning - operation may be affected
    Warning,
    /// Error - operation failed
    Error,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Debug => write!(f, "debug"),
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
        }
    }
}

/// Main error type for finflow-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("You must be logged in")]
    Unauthenticated,

    #[error("Auth provider unavailable: {message}")]
    AuthUnavailable { message: String },

    /// The provider's own message, shown to the user as-is
    #[error("{message}")]
    AuthRejected { message: String },

    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Invalid response from {url}: {message}")]
    InvalidResponse { url: String, message: String },

    #[error("Fetching transactions failed with status {status}")]
    FetchFailed { status: u16 },

    /// Carries the `detail` string returned by the upload endpoint
    #[error("{detail}")]
    UploadRejected { status: u16, detail: String },

    #[error("Unsupported file type: {name}")]
    UnsupportedFileType { name: String },

    #[error("File is too large: {size} bytes (limit {limit})")]
    FileTooLarge { size: usize, limit: usize },

    #[error("An upload is already in progress")]
    UploadInProgress,

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Cancelled")]
    Cancelled,
}

impl CoreError {
    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::Unauthenticated => ErrorCode::Unauthenticated,
            CoreError::AuthUnavailable { .. } => ErrorCode::AuthUnavailable,
            CoreError::AuthRejected { .. } => ErrorCode::AuthRejected,
            CoreError::Transport { .. } => ErrorCode::Transport,
            CoreError::InvalidResponse { .. } => ErrorCode::InvalidResponse,
            CoreError::FetchFailed { .. } => ErrorCode::FetchFailed,
            CoreError::UploadRejected { .. } => ErrorCode::UploadRejected,
            CoreError::UnsupportedFileType { .. } => ErrorCode::UnsupportedFileType,
            CoreError::FileTooLarge { .. } => ErrorCode::FileTooLarge,
            CoreError::UploadInProgress => ErrorCode::UploadInProgress,
            CoreError::ValidationError { .. } => ErrorCode::ValidationError,
            CoreError::Cancelled => ErrorCode::Cancelled,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::Cancelled => ErrorSeverity::Debug,
            CoreError::Unauthenticated => ErrorSeverity::Info,
            CoreError::AuthRejected { .. } => ErrorSeverity::Info,
            CoreError::UnsupportedFileType { .. } => ErrorSeverity::Info,
            CoreError::FileTooLarge { .. } => ErrorSeverity::Info,
            CoreError::UploadInProgress => ErrorSeverity::Info,
            CoreError::ValidationError { .. } => ErrorSeverity::Info,
            CoreError::UploadRejected { .. } => ErrorSeverity::Warning,
            CoreError::FetchFailed { .. } => ErrorSeverity::Error,
            CoreError::AuthUnavailable { .. } => ErrorSeverity::Error,
            CoreError::Transport { .. } => ErrorSeverity::Error,
            CoreError::InvalidResponse { .. } => ErrorSeverity::Error,
        }
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::Unauthenticated => {
                details = details.with_suggestion("Sign in again to continue.".to_string());
            }
            CoreError::AuthUnavailable { .. } => {
                details = details.with_suggestion(
                    "The sign-in service is not responding. Try again shortly.".to_string(),
                );
            }
            CoreError::UploadRejected { status, .. } => {
                details = details.with_detail(serde_json::json!({ "status": status }));
            }
            CoreError::UnsupportedFileType { .. } => {
                details = details.with_suggestion(
                    "Export the statement from your bank as CSV or Excel (.xlsx).".to_string(),
                );
            }
            CoreError::FileTooLarge { limit, .. } => {
                details = details.with_suggestion(format!(
                    "Split the statement into files smaller than {} bytes.",
                    limit
                ));
            }
            CoreError::UploadInProgress => {
                details = details.with_suggestion(
                    "Wait for the current upload to finish before sending another.".to_string(),
                );
            }
            _ => {}
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

/// Error context for reporting
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// User ID (if authenticated)
    pub user_id: Option<String>,
    /// Operation being performed
    pub operation: String,
}

impl ErrorContext {
    pub fn new(operation: &str) -> Self {
        Self {
            user_id: None,
            operation: operation.to_string(),
        }
    }

    pub fn with_user_id(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }
}

/// Error logger trait
pub trait ErrorLogger: Send + Sync {
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
}

/// Default error logger using log crate, leveled by severity
#[derive(Default)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        let level = match error.severity() {
            ErrorSeverity::Debug => log::Level::Debug,
            ErrorSeverity::Info => log::Level::Info,
            ErrorSeverity::Warning => log::Level::Warn,
            ErrorSeverity::Error => log::Level::Error,
        };
        log::log!(
            target: "finflow::error",
            level,
            "[{}] {} - Operation: {} - User: {:?}",
            error.code(),
            error,
            context.operation,
            context.user_id
        );
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::Unauthenticated.to_string(), "UNAUTHENTICATED");
        assert_eq!(ErrorCode::UploadRejected.to_string(), "UPLOAD_REJECTED");
        assert_eq!(ErrorCode::UnsupportedFileType.to_string(), "UNSUPPORTED_FILE_TYPE");
    }

    #[test]
    fn test_upload_rejected_displays_detail_verbatim() {
        let error = CoreError::UploadRejected {
            status: 500,
            detail: "Unsupported file type".to_string(),
        };
        assert_eq!(error.to_string(), "Unsupported file type");
        assert_eq!(error.code(), ErrorCode::UploadRejected);
        let details = error.to_details();
        assert_eq!(details.details, Some(serde_json::json!({ "status": 500 })));
    }

    #[test]
    fn test_auth_rejected_displays_provider_message() {
        let error = CoreError::AuthRejected {
            message: "Invalid login credentials".to_string(),
        };
        assert_eq!(error.to_string(), "Invalid login credentials");
        assert_eq!(error.severity(), ErrorSeverity::Info);
    }

    #[test]
    fn test_severity() {
        assert_eq!(CoreError::Cancelled.severity(), ErrorSeverity::Debug);
        assert_eq!(CoreError::FetchFailed { status: 401 }.severity(), ErrorSeverity::Error);
        assert_eq!(
            CoreError::AuthUnavailable { message: "timeout".to_string() }.severity(),
            ErrorSeverity::Error
        );
    }

    #[test]
    fn test_error_context() {
        let context = ErrorContext::new("load_transactions").with_user_id("user-1");
        assert_eq!(context.operation, "load_transactions");
        assert_eq!(context.user_id, Some("user-1".to_string()));
    }

    #[test]
    fn test_error_details_serialize_code() {
        let details = CoreError::UploadInProgress.to_details();
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["code"], "UPLOAD_IN_PROGRESS");
        assert_eq!(json["suggestions"].as_array().map(|s| s.len()), Some(1));
    }
}
