use thiserror::Error;

/// A single problem found while validating configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Unified error type for the qBittorrent client.
#[derive(Error, Debug, Clone)]
pub enum QbtError {
    /// Entity not found (unknown torrent hash, missing file)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Login rejected by the server
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// A session-bound call was made without a live session
    #[error("Not authenticated. Please log in first.")]
    NotAuthenticated,

    /// Operation timed out
    #[error("Operation timed out: {0}")]
    TimedOut(String),

    /// Network error - connection refused, reset, DNS failure
    #[error("Network error: {0}")]
    NetworkError(String),

    /// API returned error with HTTP status code
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Validation error with messages
    #[error("Validation error: {}", .0.iter().map(|i| i.to_string()).collect::<Vec<_>>().join("; "))]
    ValidationError(Vec<ValidationIssue>),

    /// Parse/serialization error
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl QbtError {
    /// Check if this error means the credentials or session were rejected
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            QbtError::AuthenticationFailed(_)
                | QbtError::NotAuthenticated
                | QbtError::ApiError {
                    status: 401 | 403,
                    ..
                }
        )
    }

    /// Check if this error indicates the server is unavailable
    pub fn is_server_unavailable(&self) -> bool {
        matches!(self, QbtError::TimedOut(_) | QbtError::NetworkError(_))
    }
}

// === Conversion Implementations ===

macro_rules! impl_from_error {
    ($err_type:ty, $arm:pat => $body:expr) => {
        impl From<$err_type> for QbtError {
            fn from(err: $err_type) -> Self {
                match err {
                    $arm => $body,
                }
            }
        }
    };
}

impl_from_error!(std::io::Error, e => match e.kind() {
    std::io::ErrorKind::NotFound => QbtError::NotFound(e.to_string()),
    std::io::ErrorKind::TimedOut => QbtError::TimedOut(e.to_string()),
    std::io::ErrorKind::InvalidInput => QbtError::InvalidArgument(e.to_string()),
    _ => QbtError::IoError(e.to_string()),
});

impl_from_error!(reqwest::Error, e => if e.is_timeout() {
    QbtError::TimedOut(e.to_string())
} else if e.is_connect() {
    QbtError::NetworkError(format!("Server unreachable: {}", e))
} else if e.is_request() {
    QbtError::NetworkError(e.to_string())
} else if e.is_decode() {
    QbtError::ParseError(e.to_string())
} else {
    QbtError::IoError(format!("HTTP error: {}", e))
});

impl_from_error!(serde_json::Error, e => QbtError::ParseError(e.to_string()));
impl_from_error!(toml::de::Error, e => QbtError::ParseError(e.to_string()));
impl_from_error!(base64::DecodeError, e => QbtError::ParseError(format!("base64: {}", e)));
impl_from_error!(std::string::FromUtf8Error, e => QbtError::ParseError(e.to_string()));

/// Result type alias for operations that can fail with QbtError.
pub type QbtResult<T> = Result<T, QbtError>;
