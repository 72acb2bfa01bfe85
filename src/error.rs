//! Error types for the Priceroom WebSocket SDK

use thiserror::Error;

/// Main error type for the SDK
#[derive(Error, Debug, Clone)]
pub enum SdkError {
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Connection-specific errors
#[derive(Error, Debug, Clone)]
pub enum ConnectionError {
    #[error("Failed to establish connection: {0}")]
    EstablishmentFailed(String),

    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Timeout occurred: {0}")]
    Timeout(String),
}

/// Parsing-specific errors
#[derive(Error, Debug, Clone)]
pub enum ParseError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Invalid data type: {0}")]
    InvalidDataType(String),

    #[error("Malformed message: {0}")]
    MalformedMessage(String),
}

/// REST retrieval errors
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Unexpected status {status} from {endpoint}")]
    Status { status: u16, endpoint: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// Processing-specific errors
///
/// Raised inside the reconciler boundary and never allowed past it.
#[derive(Error, Debug, Clone)]
pub enum ProcessingError {
    #[error("Message processing failed: {0}")]
    ProcessingFailed(String),

    #[error("Callback error: {0}")]
    CallbackError(String),
}

/// Error severity levels
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorSeverity {
    Low,    // Warnings, non-critical issues
    Medium, // Recoverable errors
    High,   // Critical errors that affect functionality
}

impl ErrorSeverity {
    pub fn from_error(error: &SdkError) -> Self {
        match error {
            SdkError::Configuration(_) => ErrorSeverity::High,
            // A failed channel is terminal for the session
            SdkError::Connection(_) => ErrorSeverity::High,
            // Malformed frames are dropped and the stream continues
            SdkError::Parse(_) => ErrorSeverity::Low,
            // Fetch failures degrade to an empty snapshot
            SdkError::Fetch(_) => ErrorSeverity::Medium,
        }
    }
}

/// Error reporter for structured logging
pub struct ErrorReporter;

impl ErrorReporter {
    pub fn report_error(error: &SdkError, operation: &str) {
        match ErrorSeverity::from_error(error) {
            ErrorSeverity::High => {
                tracing::error!("HIGH SEVERITY: {} | Operation: {}", error, operation);
            }
            ErrorSeverity::Medium => {
                tracing::warn!("MEDIUM SEVERITY: {} | Operation: {}", error, operation);
            }
            ErrorSeverity::Low => {
                tracing::debug!("LOW SEVERITY: {} | Operation: {}", error, operation);
            }
        }
    }
}
