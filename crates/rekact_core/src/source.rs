//! Where act strings are read from.

use std::fs;
use std::path::PathBuf;

use crate::error::Result;

/// Source of a kact: inline text or a file holding an act string or a
/// whole sensor payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KactSource {
    Text(String),
    File(PathBuf),
}

impl KactSource {
    /// Read the raw text of this source.
    pub fn read(&self) -> Result<String> {
        match self {
            Self::Text(text) => Ok(text.clone()),
            Self::File(path) => {
                tracing::debug!("Reading kact from {}", path.display());
                Ok(fs::read_to_string(path)?)
            }
        }
    }
}

impl From<&str> for KactSource {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<PathBuf> for KactSource {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}
