//! Error types for IVT

use thiserror::Error;

/// Result type alias for IVT operations
pub type Result<T> = std::result::Result<T, IvtError>;

/// Main error type for IVT
#[derive(Error, Debug)]
pub enum IvtError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input could not be decoded or held no usable rows
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl IvtError {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Whether this error came from decoding the input file
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}
