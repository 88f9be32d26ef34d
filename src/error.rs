//! Error types for typerush
//!
//! The engine itself never fails on behalf of the caller; these errors are
//! what collaborators report back, and what the binary surfaces at startup.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the typerush library
#[derive(Error, Debug)]
pub enum TyperushError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by result/telemetry stores
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised by a remote content source
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContentError {
    #[error("Content source unavailable: {0}")]
    Unavailable(String),

    #[error("Content source returned no text")]
    Empty,
}

/// Errors raised while loading or saving settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

pub type Result<T, E = TyperushError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn open_missing() -> Result<Vec<u8>> {
        let path = PathBuf::from("/nonexistent/typerush/config.json");
        let bytes = std::fs::read(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(bytes)
    }

    #[test]
    fn collaborator_errors_convert_upward() {
        assert_matches!(open_missing(), Err(TyperushError::Config(ConfigError::Io { .. })));

        let err: TyperushError = ContentError::Empty.into();
        assert_eq!(err.to_string(), "Content error: Content source returned no text");

        let err: TyperushError = PersistenceError::Unavailable("locked".into()).into();
        assert_matches!(err, TyperushError::Persistence(PersistenceError::Unavailable(_)));
    }
}
