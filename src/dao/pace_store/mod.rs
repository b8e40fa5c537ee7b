pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{
    DailyAggregateEntity, FlightRecordEntity, HoleTimingEntity, LivePositionEntity,
    PaceConfigEntity,
};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for pace configuration, live flight
/// telemetry, and historical timing records.
pub trait PaceStore: Send + Sync {
    /// Load the pace configuration for a (club, course) pair, if one exists.
    fn load_pace_config(
        &self,
        club_id: &str,
        course_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<PaceConfigEntity>>>;

    /// Persist the pace configuration for a (club, course) pair.
    fn save_pace_config(
        &self,
        club_id: &str,
        course_id: &str,
        config: PaceConfigEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;

    /// Update the latest observed position on the live flight document.
    fn update_live_position(
        &self,
        flight_id: Uuid,
        position: LivePositionEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;

    /// Append one hole timing record to a flight's timeline.
    fn append_hole_timing(
        &self,
        flight_id: Uuid,
        timing: HoleTimingEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;

    /// Persist the final record of a completed flight.
    fn save_flight_record(
        &self,
        record: FlightRecordEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;

    /// Fetch the pre-aggregated daily document for a club, if one exists.
    ///
    /// `date` uses the `YYYY-MM-DD` document key convention.
    fn daily_aggregate(
        &self,
        club_id: &str,
        date: &str,
    ) -> BoxFuture<'static, StorageResult<Option<DailyAggregateEntity>>>;

    /// Fetch historical flight records for a club since `since_ms`, ordered by
    /// descending timestamp and capped at `limit` documents.
    fn flight_history(
        &self,
        club_id: &str,
        since_ms: i64,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<FlightRecordEntity>>>;

    /// Verify the backend connection is alive.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;

    /// Attempt to re-establish a lost backend connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
