//! Typed error handling for the explorer crate
//!
//! Library APIs return [`ExplorerError`] (or one of its category types) so
//! callers can react to specific failures instead of matching on strings.
//!
//! # Error Categories
//!
//! - [`StorageError`]: the key-value persistence port refused a read or write
//! - [`RemoteError`]: the character API could not be reached or answered badly
//! - [`ConfigError`]: configuration could not be read, parsed or validated
//!
//! The favorites store and the query codec never surface errors: persistence
//! failures are logged and absorbed there, and decoding is total. Errors only
//! reach callers from the remote client, configuration loading and the raw
//! storage adapters.
//!
//! # Example
//!
//! ```rust,ignore
//! match explorer.detail(9999).await {
//!     Ok(view) => println!("{}", view.character.name),
//!     Err(ExplorerError::Remote(RemoteError::NotFound { id })) => {
//!         println!("character {} does not exist", id);
//!     }
//!     Err(e) => eprintln!("[{}] {}", e.error_code(), e),
//! }
//! ```

use std::fmt;

/// The main error type for the explorer crate
#[derive(Debug)]
pub enum ExplorerError {
    /// Persistence port errors
    Storage(StorageError),

    /// Remote character API errors
    Remote(RemoteError),

    /// Configuration errors
    Config(ConfigError),

    /// Internal errors (should not happen in normal operation)
    Internal(String),
}

impl fmt::Display for ExplorerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExplorerError::Storage(e) => write!(f, "{}", e),
            ExplorerError::Remote(e) => write!(f, "{}", e),
            ExplorerError::Config(e) => write!(f, "{}", e),
            ExplorerError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ExplorerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExplorerError::Storage(e) => Some(e),
            ExplorerError::Remote(e) => Some(e),
            ExplorerError::Config(e) => Some(e),
            ExplorerError::Internal(_) => None,
        }
    }
}

impl ExplorerError {
    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ExplorerError::Storage(e) => e.error_code(),
            ExplorerError::Remote(e) => e.error_code(),
            ExplorerError::Config(_) => "CONFIG_ERROR",
            ExplorerError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether retrying the same operation later may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ExplorerError::Remote(e) => e.is_transient(),
            ExplorerError::Storage(StorageError::Unavailable { .. }) => true,
            _ => false,
        }
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors raised by a key-value persistence backend
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Writing would exceed the backend's size limit
    #[error("Storage quota exceeded writing '{key}' ({requested} bytes requested, {limit} allowed)")]
    QuotaExceeded {
        key: String,
        requested: usize,
        limit: usize,
    },

    /// The backend is disabled or cannot be reached
    #[error("Storage backend '{backend}' is unavailable")]
    Unavailable { backend: String },

    /// The persisted data could not be parsed
    #[error("Storage backend '{backend}' holds corrupted data: {message}")]
    Corrupted { backend: String, message: String },

    /// Underlying I/O failure
    #[error("Storage I/O error on '{backend}': {message}")]
    Io { backend: String, message: String },
}

impl StorageError {
    pub fn error_code(&self) -> &'static str {
        match self {
            StorageError::QuotaExceeded { .. } => "STORAGE_QUOTA_EXCEEDED",
            StorageError::Unavailable { .. } => "STORAGE_UNAVAILABLE",
            StorageError::Corrupted { .. } => "STORAGE_CORRUPTED",
            StorageError::Io { .. } => "STORAGE_IO_ERROR",
        }
    }
}

impl From<StorageError> for ExplorerError {
    fn from(err: StorageError) -> Self {
        ExplorerError::Storage(err)
    }
}

// =============================================================================
// Remote Errors
// =============================================================================

/// Errors raised while talking to the remote character API
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The request never produced a response (DNS, connect, timeout)
    #[error("Request to '{url}' failed: {message}")]
    Transport { url: String, message: String },

    /// The API answered with a non-success status
    #[error("{body}")]
    Status { status: u16, body: String },

    /// The requested character does not exist
    #[error("Character with id '{id}' not found")]
    NotFound { id: i64 },

    /// The response body did not match the expected shape
    #[error("Failed to decode response from '{url}': {message}")]
    Decode { url: String, message: String },

    /// The configured base URL cannot be joined with a path
    #[error("Invalid API URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

impl RemoteError {
    /// Build a status error, using the response body when it is not empty
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let body = if body.trim().is_empty() {
            format!("Request failed {}", status)
        } else {
            body
        };
        RemoteError::Status { status, body }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RemoteError::Transport { .. } => "REMOTE_TRANSPORT_ERROR",
            RemoteError::Status { .. } => "REMOTE_STATUS_ERROR",
            RemoteError::NotFound { .. } => "CHARACTER_NOT_FOUND",
            RemoteError::Decode { .. } => "REMOTE_DECODE_ERROR",
            RemoteError::InvalidUrl { .. } => "INVALID_API_URL",
        }
    }

    /// Transport failures and server-side statuses are worth another attempt
    pub fn is_transient(&self) -> bool {
        match self {
            RemoteError::Transport { .. } => true,
            RemoteError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<RemoteError> for ExplorerError {
    fn from(err: RemoteError) -> Self {
        ExplorerError::Remote(err)
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        let url = err.url().map(|u| u.to_string()).unwrap_or_default();
        if err.is_decode() {
            RemoteError::Decode {
                url,
                message: err.to_string(),
            }
        } else if let Some(status) = err.status() {
            RemoteError::status(status.as_u16(), String::new())
        } else {
            RemoteError::Transport {
                url,
                message: err.to_string(),
            }
        }
    }
}

impl From<reqwest::Error> for ExplorerError {
    fn from(err: reqwest::Error) -> Self {
        ExplorerError::Remote(err.into())
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to parse configuration
    #[error("Failed to parse config{}: {message}", file_suffix(.file))]
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Configuration parsed but holds invalid values
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// IO error while reading configuration
    #[error("IO error: {message}")]
    IoError { message: String },
}

fn file_suffix(file: &Option<String>) -> String {
    file.as_ref()
        .map(|f| format!(" file '{}'", f))
        .unwrap_or_default()
}

impl From<ConfigError> for ExplorerError {
    fn from(err: ConfigError) -> Self {
        ExplorerError::Config(err)
    }
}

impl From<validator::ValidationErrors> for ConfigError {
    fn from(err: validator::ValidationErrors) -> Self {
        ConfigError::Invalid {
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<serde_json::Error> for ExplorerError {
    fn from(err: serde_json::Error) -> Self {
        ExplorerError::Internal(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for ExplorerError {
    fn from(err: serde_yaml::Error) -> Self {
        ExplorerError::Config(ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        })
    }
}

impl From<std::io::Error> for ExplorerError {
    fn from(err: std::io::Error) -> Self {
        ExplorerError::Internal(format!("IO error: {}", err))
    }
}

impl From<anyhow::Error> for ExplorerError {
    fn from(err: anyhow::Error) -> Self {
        ExplorerError::Internal(err.to_string())
    }
}

/// Result type alias using ExplorerError
pub type ExplorerResult<T> = Result<T, ExplorerError>;
