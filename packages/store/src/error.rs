use thiserror::Error;

/// Errors produced by the record store and the blob manager.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Required input was missing or malformed.
    #[error("{0}")]
    Validation(String),
    /// The supplied record identifier is not a well-formed integer.
    #[error("'{0}' is not a valid item id")]
    InvalidId(String),
    /// The table, a record, or a blob does not exist.
    #[error("{0}")]
    NotFound(String),
    /// The upload exceeds the configured size limit.
    #[error("upload exceeds size limit ({actual} > {limit} bytes)")]
    TooLarge { actual: u64, limit: u64 },
    /// An I/O error occurred.
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The table document on disk could not be parsed.
    #[error("table document is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}
