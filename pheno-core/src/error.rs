//! # Error Types for Pheno
//!
//! Unified error handling for encoding, tracking and persistence.

use thiserror::Error;

/// Main error type for phenotype analysis operations
#[derive(Error, Debug)]
pub enum PhenoError {
    /// Input outside the domain of an encoder or estimator
    #[error("Domain error: {0}")]
    Domain(String),

    /// IO error (snapshot write/read)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot is structurally invalid or breaks a tracker invariant
    #[error("Format error: {0}")]
    Format(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for phenotype analysis operations
pub type PhenoResult<T> = Result<T, PhenoError>;

impl PhenoError {
    /// Create a domain error
    pub fn domain(msg: impl Into<String>) -> Self {
        Self::Domain(msg.into())
    }

    /// Create a format error
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<bincode::Error> for PhenoError {
    fn from(err: bincode::Error) -> Self {
        match *err {
            bincode::ErrorKind::Io(io) => Self::Io(io),
            other => Self::Format(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for PhenoError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            Self::Io(err.into())
        } else {
            Self::Format(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_syntax_error_is_format() {
        let err: PhenoError = serde_json::from_str::<u32>("{").unwrap_err().into();
        assert!(matches!(err, PhenoError::Format(_)));
    }

    #[test]
    fn test_bincode_io_error_is_io() {
        let empty: &[u8] = &[];
        let err: PhenoError = bincode::deserialize_from::<_, u64>(empty).unwrap_err().into();
        assert!(matches!(err, PhenoError::Io(_)));
    }
}
