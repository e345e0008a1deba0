//! Error types for the Venture client runtime.

use thiserror::Error;

/// A shared error type for the non-transport parts of the runtime.
///
/// Transport failures have their own closed taxonomy in
/// `venture-interaction`; this type covers configuration, storage, and
/// serialization problems, none of which are fatal to the process.
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    /// Configuration error (missing or invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage error (preference file I/O)
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },
}

impl CoreError {
    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if this is a storage error
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for CoreError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for CoreError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, CoreError>`.
pub type Result<T> = std::result::Result<T, CoreError>;
