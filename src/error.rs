use thiserror::Error;

/// Main error type for anf-dual operations
#[derive(Debug, Error)]
pub enum AnfError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Azure API error (HTTP {status}): {message}")]
    AzureApiError { status: u16, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Resource not found: {id}")]
    ResourceNotFound { id: String },

    #[error("Long-running operation ended with status '{status}': {message}")]
    OperationFailed { status: String, message: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Connection timeout: {0}")]
    ConnectionTimeout(String),

    #[error("Connection refused: {0}")]
    ConnectionRefused(String),

    #[error("SSL/TLS error: {0}")]
    SslError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Operation timeout: {0}")]
    Timeout(String),
}

impl AnfError {
    pub fn authentication<S: Into<String>>(msg: S) -> Self {
        Self::AuthenticationError(msg.into())
    }

    pub fn azure_api<S: Into<String>>(status: u16, msg: S) -> Self {
        Self::AzureApiError {
            status,
            message: msg.into(),
        }
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn not_found<S: Into<String>>(id: S) -> Self {
        Self::ResourceNotFound { id: id.into() }
    }

    pub fn operation_failed<S: Into<String>>(status: S, msg: S) -> Self {
        Self::OperationFailed {
            status: status.into(),
            message: msg.into(),
        }
    }

    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::NetworkError(msg.into())
    }

    pub fn connection_timeout<S: Into<String>>(msg: S) -> Self {
        Self::ConnectionTimeout(msg.into())
    }

    pub fn connection_refused<S: Into<String>>(msg: S) -> Self {
        Self::ConnectionRefused(msg.into())
    }

    pub fn ssl_error<S: Into<String>>(msg: S) -> Self {
        Self::SslError(msg.into())
    }

    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Self::SerializationError(msg.into())
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        Self::Timeout(msg.into())
    }

    /// Message suitable for the "An error occurred while ..." console lines.
    ///
    /// Azure API errors carry the management plane's message without the
    /// HTTP status prefix.
    pub fn user_message(&self) -> String {
        match self {
            Self::AzureApiError { message, .. } => message.clone(),
            Self::OperationFailed { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for anf-dual operations
pub type Result<T> = std::result::Result<T, AnfError>;

/// Convert Azure Core errors to AnfError
impl From<azure_core::Error> for AnfError {
    fn from(error: azure_core::Error) -> Self {
        // Only credential acquisition goes through azure_core; no HTTP status to carry
        Self::AuthenticationError(error.to_string())
    }
}
