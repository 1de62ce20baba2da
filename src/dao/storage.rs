use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Largest identifier set a single "identifier is one of" query may carry.
pub const MAX_BATCH_IDS: usize = 30;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A uniqueness rule of the collection rejected the write.
    #[error("{collection} already holds a document for `{key}`")]
    Conflict {
        collection: &'static str,
        key: String,
    },
    /// Batched lookups are capped at [`MAX_BATCH_IDS`] identifiers.
    #[error("batch of {requested} identifiers exceeds the limit of {MAX_BATCH_IDS}")]
    BatchTooLarge { requested: usize },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a uniqueness violation for `collection`.
    pub fn conflict(collection: &'static str, key: impl Into<String>) -> Self {
        StorageError::Conflict {
            collection,
            key: key.into(),
        }
    }
}

/// Reject identifier batches that the document store would refuse.
pub fn ensure_batch_size(requested: usize) -> StorageResult<()> {
    if requested > MAX_BATCH_IDS {
        return Err(StorageError::BatchTooLarge { requested });
    }
    Ok(())
}
