use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use thiserror::Error;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Server error code reported when a unique index rejects a write.
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("missing MongoDB environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to write to `{collection}` for `{key}`")]
    Write {
        collection: &'static str,
        key: String,
        #[source]
        source: MongoError,
    },
    #[error("`{collection}` already holds a document for `{key}`")]
    Duplicate {
        collection: &'static str,
        key: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to read from `{collection}`")]
    Read {
        collection: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("stored document `{id}` in `{collection}` is malformed: {reason}")]
    InvalidDocument {
        collection: &'static str,
        id: String,
        reason: &'static str,
    },
}

impl MongoDaoError {
    /// Classify a failed write, separating unique index violations from other failures.
    pub fn write(collection: &'static str, key: impl Into<String>, source: MongoError) -> Self {
        let key = key.into();
        if is_duplicate_key(&source) {
            MongoDaoError::Duplicate {
                collection,
                key,
                source,
            }
        } else {
            MongoDaoError::Write {
                collection,
                key,
                source,
            }
        }
    }

    pub fn read(collection: &'static str, source: MongoError) -> Self {
        MongoDaoError::Read { collection, source }
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY_CODE
    )
}
