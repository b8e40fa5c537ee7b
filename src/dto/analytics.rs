use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dao::models::{DailyAggregateEntity, HoleAggregateEntity, OverallAggregateEntity};

/// Congestion classification for a hole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum TrafficRank {
    /// More samples than the high-traffic cutoff.
    High,
    /// Everything else.
    Normal,
}

impl TrafficRank {
    fn from_label(label: &str) -> Self {
        if label == "High" {
            TrafficRank::High
        } else {
            TrafficRank::Normal
        }
    }
}

/// Aggregated statistics for one hole.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HoleStat {
    /// Hole number.
    pub number: u8,
    /// Average minutes spent on the hole.
    pub avg_time_minutes: i64,
    /// Configured target minutes.
    pub target_minutes: u32,
    /// Percentage of samples that exceeded the target.
    pub delay_frequency_percent: u32,
    /// Congestion classification.
    pub traffic_rank: TrafficRank,
}

impl From<HoleAggregateEntity> for HoleStat {
    fn from(value: HoleAggregateEntity) -> Self {
        Self {
            number: value.number,
            avg_time_minutes: value.avg_time_minutes,
            target_minutes: value.target_minutes,
            delay_frequency_percent: value.delay_frequency_percent,
            traffic_rank: TrafficRank::from_label(&value.traffic_rank),
        }
    }
}

/// Club-wide pace KPIs for a reporting window.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OverallStats {
    /// Rendered average round time, e.g. `"4h 12m"`.
    pub avg_round_time: String,
    /// Number of flights in the window.
    pub total_flights: u64,
    /// Percentage of flights within the on-time cutoff.
    pub on_time_percent: u32,
    /// Hole numbers flagged as critical, at most three.
    pub critical_holes: Vec<u8>,
    /// Rendered delay trend, e.g. `"+7m"` or `"Stable"`.
    pub delay_trend: String,
}

impl From<OverallAggregateEntity> for OverallStats {
    fn from(value: OverallAggregateEntity) -> Self {
        Self {
            avg_round_time: value.avg_round_time,
            total_flights: value.total_flights,
            on_time_percent: value.on_time_percent,
            critical_holes: value.critical_holes,
            delay_trend: value.delay_trend,
        }
    }
}

/// Full pace report returned by the analytics endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaceReport {
    /// Club-wide KPIs.
    pub overall: OverallStats,
    /// Per-hole statistics, ordered by first appearance in the source data.
    pub hole_stats: Vec<HoleStat>,
}

impl From<DailyAggregateEntity> for PaceReport {
    fn from(value: DailyAggregateEntity) -> Self {
        Self {
            overall: value.overall.into(),
            hole_stats: value.hole_stats.into_iter().map(Into::into).collect(),
        }
    }
}
