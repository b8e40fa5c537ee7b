use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Database,
    bson::{doc, serialize_to_bson},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoDailyDocument, MongoFlightRecordDocument, MongoPaceConfigDocument, config_doc_id,
        daily_doc_id,
    },
};
use crate::dao::{
    models::{
        DailyAggregateEntity, FlightRecordEntity, HoleTimingEntity, LivePositionEntity,
        PaceConfigEntity,
    },
    pace_store::PaceStore,
    storage::StorageResult,
};

const PACE_CONFIG_COLLECTION: &str = "pace_config";
const ACTIVE_FLIGHTS_COLLECTION: &str = "active_flights";
const HISTORY_COLLECTION: &str = "pace_analytics_history";
const DAILY_STATS_COLLECTION: &str = "daily_stats";

/// MongoDB-backed [`PaceStore`].
#[derive(Clone)]
pub struct MongoPaceStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    _client: Client,
    database: Database,
}

impl MongoInner {
    async fn database(&self) -> Database {
        self.state.read().await.database.clone()
    }

    async fn ping(&self) -> MongoResult<()> {
        let database = self.database().await;
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard._client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoPaceStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let store = Self {
            inner: Arc::new(MongoInner {
                state: RwLock::new(MongoState {
                    _client: client,
                    database,
                }),
                config,
            }),
        };
        store.ensure_indexes().await?;
        Ok(store)
    }

    /// History queries filter by club and time window, so keep a compound
    /// index matching the descending sort.
    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.inner.database().await;
        let collection = database.collection::<MongoFlightRecordDocument>(HISTORY_COLLECTION);
        let index = mongodb::IndexModel::builder()
            .keys(doc! { "club_id": 1, "timestamp_ms": -1 })
            .options(
                IndexOptions::builder()
                    .name(Some("history_club_time_idx".to_owned()))
                    .build(),
            )
            .build();

        collection
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: HISTORY_COLLECTION,
                index: "club_id_timestamp",
                source,
            })?;
        Ok(())
    }
}

impl PaceStore for MongoPaceStore {
    fn load_pace_config(
        &self,
        club_id: &str,
        course_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<PaceConfigEntity>>> {
        let id = config_doc_id(club_id, course_id);
        let inner = self.inner.clone();
        Box::pin(async move {
            let collection = inner
                .database()
                .await
                .collection::<MongoPaceConfigDocument>(PACE_CONFIG_COLLECTION);
            let document = collection
                .find_one(doc! { "_id": &id })
                .await
                .map_err(|source| MongoDaoError::Operation {
                    operation: "load_pace_config",
                    source,
                })?;
            Ok(document.map(Into::into))
        })
    }

    fn save_pace_config(
        &self,
        club_id: &str,
        course_id: &str,
        config: PaceConfigEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let id = config_doc_id(club_id, course_id);
        let inner = self.inner.clone();
        Box::pin(async move {
            let collection = inner
                .database()
                .await
                .collection::<MongoPaceConfigDocument>(PACE_CONFIG_COLLECTION);
            let document = MongoPaceConfigDocument::from_entity(id.clone(), config);
            collection
                .replace_one(doc! { "_id": &id }, document)
                .upsert(true)
                .await
                .map_err(|source| MongoDaoError::Operation {
                    operation: "save_pace_config",
                    source,
                })?;
            Ok(())
        })
    }

    fn update_live_position(
        &self,
        flight_id: Uuid,
        position: LivePositionEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let collection = inner
                .database()
                .await
                .collection::<mongodb::bson::Document>(ACTIVE_FLIGHTS_COLLECTION);
            let update = doc! {
                "$set": {
                    "location": { "lat": position.lat, "lng": position.lng },
                    "player_id": position.player_id.as_deref().unwrap_or("unknown"),
                    "player_name": position.player_name.as_deref().unwrap_or("Guest Player"),
                    "session_code": &position.session_code,
                    "club_id": &position.club_id,
                    "course_id": &position.course_id,
                    "updated_at_ms": position.captured_at_ms,
                }
            };
            collection
                .update_one(doc! { "_id": flight_id.to_string() }, update)
                .upsert(true)
                .await
                .map_err(|source| MongoDaoError::Operation {
                    operation: "update_live_position",
                    source,
                })?;
            Ok(())
        })
    }

    fn append_hole_timing(
        &self,
        flight_id: Uuid,
        timing: HoleTimingEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let collection = inner
                .database()
                .await
                .collection::<mongodb::bson::Document>(ACTIVE_FLIGHTS_COLLECTION);
            let value = serialize_to_bson(&timing).map_err(|source| {
                crate::dao::storage::StorageError::unavailable(
                    "failed to serialize hole timing".into(),
                    source,
                )
            })?;
            let field = format!("hole_stats.{}", timing.hole_number);
            collection
                .update_one(
                    doc! { "_id": flight_id.to_string() },
                    doc! { "$set": { field: value } },
                )
                .upsert(true)
                .await
                .map_err(|source| MongoDaoError::Operation {
                    operation: "append_hole_timing",
                    source,
                })?;
            Ok(())
        })
    }

    fn save_flight_record(
        &self,
        record: FlightRecordEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let collection = inner
                .database()
                .await
                .collection::<MongoFlightRecordDocument>(HISTORY_COLLECTION);
            collection
                .insert_one(MongoFlightRecordDocument::from(record))
                .await
                .map_err(|source| MongoDaoError::Operation {
                    operation: "save_flight_record",
                    source,
                })?;
            Ok(())
        })
    }

    fn daily_aggregate(
        &self,
        club_id: &str,
        date: &str,
    ) -> BoxFuture<'static, StorageResult<Option<DailyAggregateEntity>>> {
        let id = daily_doc_id(club_id, date);
        let inner = self.inner.clone();
        Box::pin(async move {
            let collection = inner
                .database()
                .await
                .collection::<MongoDailyDocument>(DAILY_STATS_COLLECTION);
            let document = collection
                .find_one(doc! { "_id": &id })
                .await
                .map_err(|source| MongoDaoError::Operation {
                    operation: "daily_aggregate",
                    source,
                })?;
            Ok(document.map(Into::into))
        })
    }

    fn flight_history(
        &self,
        club_id: &str,
        since_ms: i64,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<FlightRecordEntity>>> {
        let club_id = club_id.to_owned();
        let inner = self.inner.clone();
        Box::pin(async move {
            let collection = inner
                .database()
                .await
                .collection::<MongoFlightRecordDocument>(HISTORY_COLLECTION);
            let documents: Vec<MongoFlightRecordDocument> = collection
                .find(doc! { "club_id": &club_id, "timestamp_ms": { "$gte": since_ms } })
                .sort(doc! { "timestamp_ms": -1 })
                .limit(limit as i64)
                .await
                .map_err(|source| MongoDaoError::Operation {
                    operation: "flight_history",
                    source,
                })?
                .try_collect()
                .await
                .map_err(|source| MongoDaoError::Operation {
                    operation: "flight_history",
                    source,
                })?;
            Ok(documents.into_iter().map(Into::into).collect())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.ping().await?;
            Ok(())
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.reconnect().await?;
            Ok(())
        })
    }
}
