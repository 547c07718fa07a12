// Error types for project configuration loading

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse datafile: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unsupported datafile version: {0}")]
    UnsupportedVersion(String),

    #[error("Invalid condition: {0}")]
    InvalidCondition(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Create an invalid condition error
    pub fn condition<S: Into<String>>(msg: S) -> Self {
        Self::InvalidCondition(msg.into())
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
