use thiserror::Error;

/// Main error type for Callscope operations
#[derive(Error, Debug)]
pub enum CallscopeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("File system error: {0}")]
    FileSystem(String),

    #[error("Invalid line range {start}-{end}: {reason}")]
    InvalidRange {
        start: usize,
        end: usize,
        reason: String,
    },

    #[error("Function '{0}' not found in call graph")]
    FunctionNotFound(String),

    #[error("Label error: {0}")]
    Label(String),
}

pub type Result<T> = std::result::Result<T, CallscopeError>;
