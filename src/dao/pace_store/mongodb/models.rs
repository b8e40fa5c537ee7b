use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::dao::models::{
    DailyAggregateEntity, FlightRecordEntity, HoleAggregateEntity, HoleTimingEntity,
    OverallAggregateEntity, PaceConfigEntity, PaceSettingsEntity,
};

/// Compose the `_id` used by per-(club, course) documents.
pub fn config_doc_id(club_id: &str, course_id: &str) -> String {
    format!("{club_id}_{course_id}")
}

/// Compose the `_id` used by daily aggregate documents.
pub fn daily_doc_id(club_id: &str, date: &str) -> String {
    format!("{club_id}_{date}")
}

/// BSON maps require string keys, so hole-number keyed maps are converted at
/// the storage boundary.
fn stringify_keys<V>(map: HashMap<u8, V>) -> HashMap<String, V> {
    map.into_iter()
        .map(|(hole, value)| (hole.to_string(), value))
        .collect()
}

fn numeric_keys<V>(map: HashMap<String, V>) -> HashMap<u8, V> {
    map.into_iter()
        .filter_map(|(hole, value)| hole.parse::<u8>().ok().map(|hole| (hole, value)))
        .collect()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MongoPaceConfigDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub holes: HashMap<String, crate::dao::models::HoleTargetEntity>,
    pub settings: PaceSettingsEntity,
}

impl MongoPaceConfigDocument {
    pub fn from_entity(id: String, entity: PaceConfigEntity) -> Self {
        Self {
            id,
            holes: stringify_keys(entity.holes),
            settings: entity.settings,
        }
    }
}

impl From<MongoPaceConfigDocument> for PaceConfigEntity {
    fn from(value: MongoPaceConfigDocument) -> Self {
        Self {
            holes: numeric_keys(value.holes),
            settings: value.settings,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MongoFlightRecordDocument {
    pub flight_id: String,
    pub flight_number: u32,
    pub club_id: String,
    pub course_id: String,
    pub total_time_minutes: i64,
    pub delay_minutes: i64,
    pub timestamp_ms: i64,
    pub hole_stats: HashMap<String, HoleTimingEntity>,
}

impl From<FlightRecordEntity> for MongoFlightRecordDocument {
    fn from(value: FlightRecordEntity) -> Self {
        Self {
            flight_id: value.flight_id.to_string(),
            flight_number: value.flight_number,
            club_id: value.club_id,
            course_id: value.course_id,
            total_time_minutes: value.total_time_minutes,
            delay_minutes: value.delay_minutes,
            timestamp_ms: value.timestamp_ms,
            hole_stats: stringify_keys(value.hole_stats),
        }
    }
}

impl From<MongoFlightRecordDocument> for FlightRecordEntity {
    fn from(value: MongoFlightRecordDocument) -> Self {
        Self {
            flight_id: value
                .flight_id
                .parse()
                .unwrap_or_else(|_| uuid::Uuid::nil()),
            flight_number: value.flight_number,
            club_id: value.club_id,
            course_id: value.course_id,
            total_time_minutes: value.total_time_minutes,
            delay_minutes: value.delay_minutes,
            timestamp_ms: value.timestamp_ms,
            hole_stats: numeric_keys(value.hole_stats),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MongoDailyDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub overall: OverallAggregateEntity,
    pub hole_stats: Vec<HoleAggregateEntity>,
}

impl From<MongoDailyDocument> for DailyAggregateEntity {
    fn from(value: MongoDailyDocument) -> Self {
        Self {
            overall: value.overall,
            hole_stats: value.hole_stats,
        }
    }
}
