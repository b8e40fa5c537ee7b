//! In-memory [`PaceStore`] used by tests and by storage-less deployments
//! (e.g. running the backend without the `mongo-store` feature).

use std::{
    collections::HashMap,
    io,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    models::{
        DailyAggregateEntity, FlightRecordEntity, HoleTimingEntity, LivePositionEntity,
        PaceConfigEntity,
    },
    pace_store::PaceStore,
    storage::{StorageError, StorageResult},
};

/// Process-local store keeping everything in maps behind mutexes.
#[derive(Clone, Default)]
pub struct MemoryPaceStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    configs: Mutex<HashMap<(String, String), PaceConfigEntity>>,
    hole_timings: Mutex<HashMap<Uuid, Vec<HoleTimingEntity>>>,
    flight_records: Mutex<Vec<FlightRecordEntity>>,
    daily: Mutex<HashMap<(String, String), DailyAggregateEntity>>,
    live_positions: Mutex<Vec<(Uuid, LivePositionEntity)>>,
    fail_writes: AtomicBool,
}

impl MemoryPaceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write operation fail until reset; reads keep working.
    /// Used to exercise persist-failure paths in tests.
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of live position updates accepted so far.
    pub fn live_position_count(&self) -> usize {
        self.inner.live_positions.lock().expect("poisoned").len()
    }

    /// Snapshot of all persisted flight records.
    pub fn flight_records(&self) -> Vec<FlightRecordEntity> {
        self.inner.flight_records.lock().expect("poisoned").clone()
    }

    /// Seed historical flight records for aggregation tests.
    pub fn seed_flight_records(&self, records: Vec<FlightRecordEntity>) {
        self.inner
            .flight_records
            .lock()
            .expect("poisoned")
            .extend(records);
    }

    /// Seed a pace configuration without going through the write gate.
    pub fn seed_pace_config(&self, club_id: &str, course_id: &str, config: PaceConfigEntity) {
        self.inner
            .configs
            .lock()
            .expect("poisoned")
            .insert((club_id.to_owned(), course_id.to_owned()), config);
    }

    /// Seed a pre-aggregated daily document.
    pub fn seed_daily_aggregate(&self, club_id: &str, date: &str, doc: DailyAggregateEntity) {
        self.inner
            .daily
            .lock()
            .expect("poisoned")
            .insert((club_id.to_owned(), date.to_owned()), doc);
    }

    fn write_gate(&self) -> StorageResult<()> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::unavailable(
                "memory store write rejected".into(),
                io::Error::new(io::ErrorKind::ConnectionRefused, "injected failure"),
            ));
        }
        Ok(())
    }
}

impl PaceStore for MemoryPaceStore {
    fn load_pace_config(
        &self,
        club_id: &str,
        course_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<PaceConfigEntity>>> {
        let key = (club_id.to_owned(), course_id.to_owned());
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.configs.lock().expect("poisoned").get(&key).cloned()) })
    }

    fn save_pace_config(
        &self,
        club_id: &str,
        course_id: &str,
        config: PaceConfigEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let key = (club_id.to_owned(), course_id.to_owned());
        let this = self.clone();
        Box::pin(async move {
            this.write_gate()?;
            this.inner
                .configs
                .lock()
                .expect("poisoned")
                .insert(key, config);
            Ok(())
        })
    }

    fn update_live_position(
        &self,
        flight_id: Uuid,
        position: LivePositionEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let this = self.clone();
        Box::pin(async move {
            this.write_gate()?;
            this.inner
                .live_positions
                .lock()
                .expect("poisoned")
                .push((flight_id, position));
            Ok(())
        })
    }

    fn append_hole_timing(
        &self,
        flight_id: Uuid,
        timing: HoleTimingEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let this = self.clone();
        Box::pin(async move {
            this.write_gate()?;
            this.inner
                .hole_timings
                .lock()
                .expect("poisoned")
                .entry(flight_id)
                .or_default()
                .push(timing);
            Ok(())
        })
    }

    fn save_flight_record(
        &self,
        record: FlightRecordEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let this = self.clone();
        Box::pin(async move {
            this.write_gate()?;
            this.inner
                .flight_records
                .lock()
                .expect("poisoned")
                .push(record);
            Ok(())
        })
    }

    fn daily_aggregate(
        &self,
        club_id: &str,
        date: &str,
    ) -> BoxFuture<'static, StorageResult<Option<DailyAggregateEntity>>> {
        let key = (club_id.to_owned(), date.to_owned());
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.daily.lock().expect("poisoned").get(&key).cloned()) })
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
            let mut records: Vec<FlightRecordEntity> = inner
                .flight_records
                .lock()
                .expect("poisoned")
                .iter()
                .filter(|record| record.club_id == club_id && record.timestamp_ms >= since_ms)
                .cloned()
                .collect();
            records.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
            records.truncate(limit);
            Ok(records)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
