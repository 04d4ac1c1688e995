//! Error types

use thiserror::Error;

/// Errors produced while reading, validating or configuring a kact.
#[derive(Error, Debug)]
pub enum KactError {
    /// Input was absent or blank after trimming
    #[error("kact input is empty")]
    EmptyInput,

    /// Input failed the lexical shape check
    #[error("kact string is malformed")]
    Malformed,

    /// A segment carried a token count outside 7..=8
    #[error("segment {segment} has {count} tokens, expected 7 or 8")]
    TokenCount { segment: usize, count: usize },

    /// A token could not be decoded into its field
    #[error("segment {segment}: invalid {field} `{value}`")]
    Decode {
        segment: usize,
        field: &'static str,
        value: String,
    },

    /// Replay configuration could not be parsed
    #[error("invalid replay config: {0}")]
    Config(String),

    /// Reading a kact source failed
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Exporting a replay trace failed
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type for kact operations
pub type Result<T> = std::result::Result<T, KactError>;
