use thiserror::Error;
use std::io;
use std::time::Duration;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Term store connection error: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Token index error: {0}")]
    Index(#[from] crate::index::IndexError),

    #[error("Malformed span: {0}")]
    Span(#[from] crate::resolver::SpanError),

    #[error("Worker error: {0}")]
    Worker(String),

    #[error("Enrichment cancelled: {0}")]
    Cancelled(String),

    #[error("Enrichment timed out after {0:?}")]
    Timeout(Duration),
}

// Type alias for Result
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Error::Storage(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn connection<S: Into<String>>(msg: S) -> Self {
        Error::Connection(msg.into())
    }

    pub fn worker<S: Into<String>>(msg: S) -> Self {
        Error::Worker(msg.into())
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<lmdb_rkv::Error> for Error {
    fn from(err: lmdb_rkv::Error) -> Self {
        Error::Database(err.to_string())
    }
}
