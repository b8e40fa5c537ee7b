use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};

/// Parsed connection settings for the MongoDB pace store.
#[derive(Clone)]
pub struct MongoConfig {
    /// Driver client options parsed from the URI.
    pub options: ClientOptions,
    /// Database that holds the pace collections.
    pub database_name: String,
}

impl MongoConfig {
    /// Parse a URI into connection settings; the database defaults to
    /// `playtrack_pace` when none is given.
    pub async fn from_uri(uri: &str, db_name: Option<&str>) -> MongoResult<Self> {
        let database_name = db_name.unwrap_or("playtrack_pace").to_owned();
        let options = ClientOptions::parse(uri)
            .await
            .map_err(|source| MongoDaoError::InvalidUri {
                uri: uri.to_owned(),
                source,
            })?;

        Ok(Self {
            options,
            database_name,
        })
    }
}
