//! Error types and exit codes for Kiln.

use std::path::PathBuf;
use thiserror::Error;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NOTE_NOT_FOUND: i32 = 2;
    pub const QUERY_PARSE_ERROR: i32 = 6;
}

/// Main error type for Kiln operations.
///
/// Only the collaborators around the core (scanner, config loader, output
/// writer, CLI) produce these. Resolution, transclusion, backlinks, graph
/// assembly and query evaluation degrade instead of failing.
#[derive(Error, Debug)]
pub enum KilnError {
    #[error("Vault not found at: {0}")]
    VaultNotFound(PathBuf),

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Invalid frontmatter in {path}: {message}")]
    InvalidFrontmatter { path: PathBuf, message: String },

    #[error("Invalid query '{query}': {message}")]
    QueryParse { query: String, message: String },

    #[error("Invalid base file {path}: {message}")]
    InvalidBase { path: PathBuf, message: String },

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Couldn't create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),
}

impl KilnError {
    /// Returns the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            KilnError::NoteNotFound(_) => exit_code::NOTE_NOT_FOUND,
            KilnError::QueryParse { .. } => exit_code::QUERY_PARSE_ERROR,
            _ => exit_code::GENERAL_ERROR,
        }
    }
}

/// Result type alias for Kiln operations.
pub type Result<T> = std::result::Result<T, KilnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            KilnError::NoteNotFound("x".to_string()).exit_code(),
            exit_code::NOTE_NOT_FOUND
        );
        assert_eq!(
            KilnError::QueryParse {
                query: "a ==".to_string(),
                message: "unexpected end".to_string(),
            }
            .exit_code(),
            exit_code::QUERY_PARSE_ERROR
        );
        assert_eq!(
            KilnError::ConfigError("bad".to_string()).exit_code(),
            exit_code::GENERAL_ERROR
        );
        // Bad frontmatter only warns during a scan; it has no exit code of its own
        assert_eq!(
            KilnError::InvalidFrontmatter {
                path: PathBuf::from("a.md"),
                message: "bad".to_string(),
            }
            .exit_code(),
            exit_code::GENERAL_ERROR
        );
    }

    #[test]
    fn test_output_dir_message_names_path() {
        let err = KilnError::OutputDir {
            path: PathBuf::from("/nope/public"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/nope/public"));
    }
}
