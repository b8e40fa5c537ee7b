mod connection;
mod error;
mod models;
pub mod store;

/// MongoDB connection settings.
pub mod config;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoPaceStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}
