use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-club alert thresholds and notification toggles.
///
/// `alert_threshold_minutes >= warning_threshold_minutes` is recommended but
/// not structurally enforced; the save endpoint validates it at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaceSettingsEntity {
    /// Minutes of delay before a flight is flagged as drifting (1-15).
    pub warning_threshold_minutes: u32,
    /// Minutes of cumulative delay that trigger pace alerts (10-30).
    pub alert_threshold_minutes: u32,
    /// Notify the flight itself when the alert threshold is crossed.
    pub auto_notify_player: bool,
    /// Notify the marshall stream when the alert threshold is crossed.
    pub auto_notify_marshall: bool,
    /// Ask the monitoring UI to play an alert tone.
    pub enable_audio_alerts: bool,
}

impl Default for PaceSettingsEntity {
    fn default() -> Self {
        Self {
            warning_threshold_minutes: 5,
            alert_threshold_minutes: 12,
            auto_notify_player: false,
            auto_notify_marshall: true,
            enable_audio_alerts: true,
        }
    }
}

/// Target timing and optional scorecard metadata for one hole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoleTargetEntity {
    /// Expected minutes to play the hole.
    pub target_minutes: u32,
    /// Par for the hole, when the course metadata provides it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub par: Option<u8>,
    /// Stroke index for the hole, when the course metadata provides it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_index: Option<u8>,
}

/// Pace-of-play configuration for one (club, course) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaceConfigEntity {
    /// Per-hole targets keyed by hole number.
    pub holes: HashMap<u8, HoleTargetEntity>,
    /// Club-wide thresholds and toggles.
    pub settings: PaceSettingsEntity,
}

/// One traversed hole for one flight, immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoleTimingEntity {
    /// Hole number (1-18).
    pub hole_number: u8,
    /// Par carried over from the pace configuration, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub par: Option<u8>,
    /// Stroke index carried over from the pace configuration, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_index: Option<u8>,
    /// Configured target duration in seconds.
    pub target_seconds: i64,
    /// Measured duration in whole seconds (floor of the millisecond delta).
    pub total_time_seconds: i64,
    /// `total_time_seconds - target_seconds`; positive means late.
    pub delta_seconds: i64,
}

/// Historical record for one completed flight, written at round close.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightRecordEntity {
    /// Identifier of the flight this record belongs to.
    pub flight_id: Uuid,
    /// Display number of the flight.
    pub flight_number: u32,
    /// Club the flight played at.
    pub club_id: String,
    /// Course the flight played on.
    pub course_id: String,
    /// Whole minutes the round took.
    pub total_time_minutes: i64,
    /// Whole minutes of cumulative delay versus the targets.
    pub delay_minutes: i64,
    /// Epoch milliseconds when the record was written.
    pub timestamp_ms: i64,
    /// Per-hole timings keyed by hole number.
    pub hole_stats: HashMap<u8, HoleTimingEntity>,
}

/// Pre-aggregated club KPIs for one day, written by the aggregation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyAggregateEntity {
    /// Club-wide KPIs for the day.
    pub overall: OverallAggregateEntity,
    /// Per-hole statistics for the day.
    pub hole_stats: Vec<HoleAggregateEntity>,
}

/// Club-wide KPI block of a daily aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallAggregateEntity {
    /// Rendered average round time, e.g. `"4h 12m"`.
    pub avg_round_time: String,
    /// Number of flights that contributed to the aggregate.
    pub total_flights: u64,
    /// Percentage of flights within the on-time cutoff.
    pub on_time_percent: u32,
    /// Hole numbers flagged as critical, at most three.
    pub critical_holes: Vec<u8>,
    /// Rendered delay trend, e.g. `"+7m"` or `"Stable"`.
    pub delay_trend: String,
}

/// Per-hole statistics block of a daily aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoleAggregateEntity {
    /// Hole number.
    pub number: u8,
    /// Average minutes spent on the hole.
    pub avg_time_minutes: i64,
    /// Configured target minutes for the hole.
    pub target_minutes: u32,
    /// Percentage of samples that exceeded the target.
    pub delay_frequency_percent: u32,
    /// `"High"` or `"Normal"` traffic classification.
    pub traffic_rank: String,
}

/// Latest observed position of a flight, kept on the live flight document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivePositionEntity {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
    /// Identifier of the reporting player, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    /// Display name of the reporting player, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
    /// Session code of the flight.
    pub session_code: String,
    /// Club the flight belongs to.
    pub club_id: String,
    /// Course the flight is playing.
    pub course_id: String,
    /// Device capture timestamp in epoch milliseconds.
    pub captured_at_ms: i64,
}
