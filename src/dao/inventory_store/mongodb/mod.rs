mod connection;
mod error;
mod models;
pub mod store;

pub use connection::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoInventoryStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            MongoDaoError::Duplicate { collection, key, .. } => {
                StorageError::conflict(collection, key)
            }
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
