use std::path::PathBuf;
use thiserror::Error;

/// Main error type for pymeta operations
#[derive(Error, Debug)]
pub enum PymetaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parser error: {0}")]
    Parser(String),

    #[error("Syntax error in {path} at line {line}")]
    Syntax { path: String, line: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{} is not a Python file or directory", .0.display())]
    InvalidInput(PathBuf),

    #[error("File {} exceeds maximum size limit of {limit} bytes", path.display())]
    FileTooLarge { path: PathBuf, limit: usize },

    #[error("{tool} failed: {status}")]
    Tool { tool: String, status: String },
}

pub type Result<T> = std::result::Result<T, PymetaError>;
