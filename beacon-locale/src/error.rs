use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocaleError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing locale file: {0}")]
    MissingFile(String),

    #[error("Unexpected document structure: {0}")]
    UnexpectedStructure(String),
}

pub type Result<T> = std::result::Result<T, LocaleError>;
