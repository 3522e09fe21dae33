use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReconcileError>;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),
    #[error("Position rejected: {0}")]
    PositionRejected(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl ReconcileError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for ReconcileError {
    fn from(e: rocksdb::Error) -> Self {
        Self::DependencyUnavailable(format!("RocksDB error: {}", e))
    }
}
