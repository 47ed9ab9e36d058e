use std::fmt;

/// Startup configuration failure. This is the only error that prevents the
/// scheduler from coming up; everything downstream degrades in place.
#[derive(Debug)]
pub enum ConfigError {
    MissingVar(&'static str),
    InvalidVar {
        name: &'static str,
        value: String,
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingVar(name) => write!(f, "required env var {} is not set", name),
            ConfigError::InvalidVar { name, value, reason } => {
                write!(f, "env var {}={:?} is invalid: {}", name, value, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Failure in the persistence gateway for a single record. Captured per-record
/// into the pass result; the remaining records are still processed.
#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Serde(serde_json::Error),
    UnknownGame(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "store I/O error: {}", e),
            StoreError::Serde(e) => write!(f, "store (de)serialization error: {}", e),
            StoreError::UnknownGame(id) => write!(f, "no game with id {}", id),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serde(e)
    }
}
