use indexmap::IndexMap;
use time::{OffsetDateTime, format_description::FormatItem, macros::format_description};

use crate::{
    dao::models::{FlightRecordEntity, HoleTimingEntity},
    dto::analytics::{HoleStat, OverallStats, PaceReport, TrafficRank},
    error::ServiceError,
    services::round_service::now_ms,
    state::SharedState,
};

/// Flights at most this many minutes behind their targets count as on time.
const ON_TIME_CUTOFF_MINUTES: i64 = 10;
/// Holes whose delay frequency exceeds this percentage are critical.
const CRITICAL_DELAY_FREQUENCY_PERCENT: u32 = 25;
/// At most this many holes are flagged as critical.
const CRITICAL_HOLES_CAP: usize = 3;
/// Holes with more samples than this are ranked as high traffic.
const HIGH_TRAFFIC_SAMPLE_COUNT: usize = 5;
/// Average delay above this many minutes turns the trend away from stable.
const STABLE_TREND_CUTOFF_MINUTES: i64 = 5;

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Reporting window for historical pace reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsPeriod {
    /// Trailing seven days.
    Week,
    /// Trailing thirty days.
    Month,
}

impl StatsPeriod {
    fn days(self) -> i64 {
        match self {
            StatsPeriod::Week => 7,
            StatsPeriod::Month => 30,
        }
    }
}

/// Today's pace report, served from the pre-aggregated daily document.
pub async fn today_report(state: &SharedState, club_id: &str) -> Result<PaceReport, ServiceError> {
    let store = state.require_pace_store().await?;
    let date = today_key();

    store
        .daily_aggregate(club_id, &date)
        .await?
        .map(PaceReport::from)
        .ok_or_else(|| {
            ServiceError::NotFound(format!("no pace data recorded for club `{club_id}` today"))
        })
}

/// Pace report over a trailing window, aggregated from flight history.
pub async fn period_report(
    state: &SharedState,
    club_id: &str,
    period: StatsPeriod,
) -> Result<PaceReport, ServiceError> {
    let store = state.require_pace_store().await?;
    let since_ms = now_ms() - period.days() * 24 * 60 * 60 * 1_000;

    let records = store
        .flight_history(club_id, since_ms, state.config().history_doc_cap())
        .await?;
    if records.is_empty() {
        return Err(ServiceError::NotFound(format!(
            "no pace history for club `{club_id}` in the selected period"
        )));
    }

    Ok(aggregate_history(&records))
}

fn today_key() -> String {
    OffsetDateTime::now_utc()
        .date()
        .format(DATE_FORMAT)
        .unwrap_or_else(|_| "unknown".into())
}

/// Reduce raw flight records into the club report. Pure so the aggregation
/// rules can be tested without a store.
pub fn aggregate_history(records: &[FlightRecordEntity]) -> PaceReport {
    let total_flights = records.len() as u64;

    let total_minutes: i64 = records.iter().map(|record| record.total_time_minutes).sum();
    let avg_minutes = mean_rounded(total_minutes, records.len());
    let avg_round_time = format!("{}h {}m", avg_minutes / 60, avg_minutes % 60);

    let on_time = records
        .iter()
        .filter(|record| record.delay_minutes <= ON_TIME_CUTOFF_MINUTES)
        .count();
    let on_time_percent = percent(on_time, records.len());

    let total_delay: i64 = records.iter().map(|record| record.delay_minutes).sum();
    let avg_delay_minutes = mean_rounded(total_delay, records.len());
    let delay_trend = if avg_delay_minutes > STABLE_TREND_CUTOFF_MINUTES {
        format!("+{avg_delay_minutes}m")
    } else {
        "Stable".to_string()
    };

    let hole_stats = per_hole_stats(records);
    let critical_holes = critical_holes(&hole_stats);

    PaceReport {
        overall: OverallStats {
            avg_round_time,
            total_flights,
            on_time_percent,
            critical_holes,
            delay_trend,
        },
        hole_stats,
    }
}

fn per_hole_stats(records: &[FlightRecordEntity]) -> Vec<HoleStat> {
    let mut samples: IndexMap<u8, Vec<&HoleTimingEntity>> = IndexMap::new();
    for record in records {
        for timing in record.hole_stats.values() {
            samples.entry(timing.hole_number).or_default().push(timing);
        }
    }
    samples.sort_keys();

    samples
        .into_iter()
        .map(|(number, timings)| {
            let count = timings.len();
            let total_seconds: i64 = timings.iter().map(|timing| timing.total_time_seconds).sum();
            let late = timings.iter().filter(|timing| timing.delta_seconds > 0).count();
            let target_minutes = timings
                .first()
                .map(|timing| (timing.target_seconds / 60) as u32)
                .unwrap_or_default();

            HoleStat {
                number,
                avg_time_minutes: ((total_seconds as f64 / count as f64) / 60.0).round() as i64,
                target_minutes,
                delay_frequency_percent: percent(late, count),
                traffic_rank: if count > HIGH_TRAFFIC_SAMPLE_COUNT {
                    TrafficRank::High
                } else {
                    TrafficRank::Normal
                },
            }
        })
        .collect()
}

/// Most delay-prone holes first; ties go to the lower hole number.
fn critical_holes(hole_stats: &[HoleStat]) -> Vec<u8> {
    let mut candidates: Vec<&HoleStat> = hole_stats
        .iter()
        .filter(|stat| stat.delay_frequency_percent > CRITICAL_DELAY_FREQUENCY_PERCENT)
        .collect();
    candidates.sort_by(|a, b| {
        b.delay_frequency_percent
            .cmp(&a.delay_frequency_percent)
            .then(a.number.cmp(&b.number))
    });
    candidates
        .into_iter()
        .take(CRITICAL_HOLES_CAP)
        .map(|stat| stat.number)
        .collect()
}

fn mean_rounded(total: i64, count: usize) -> i64 {
    (total as f64 / count as f64).round() as i64
}

fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::{DailyAggregateEntity, OverallAggregateEntity},
            pace_store::memory::MemoryPaceStore,
        },
        services::capture::testing::CountingCapture,
        state::AppState,
    };

    fn record(delay_minutes: i64, holes: Vec<HoleTimingEntity>) -> FlightRecordEntity {
        FlightRecordEntity {
            flight_id: Uuid::new_v4(),
            flight_number: 1,
            club_id: "club_pinetina".into(),
            course_id: "default".into(),
            total_time_minutes: 250,
            delay_minutes,
            timestamp_ms: now_ms(),
            hole_stats: holes
                .into_iter()
                .map(|timing| (timing.hole_number, timing))
                .collect(),
        }
    }

    fn timing(hole_number: u8, total_time_seconds: i64, target_seconds: i64) -> HoleTimingEntity {
        HoleTimingEntity {
            hole_number,
            par: None,
            stroke_index: None,
            target_seconds,
            total_time_seconds,
            delta_seconds: total_time_seconds - target_seconds,
        }
    }

    async fn test_state() -> (SharedState, MemoryPaceStore) {
        let state = AppState::with_capture(
            AppConfig::default(),
            Arc::new(CountingCapture::default()),
        );
        let store = MemoryPaceStore::default();
        state.install_pace_store(Arc::new(store.clone())).await;
        (state, store)
    }

    #[tokio::test]
    async fn on_time_percentage_counts_the_cutoff_inclusively() {
        let (state, store) = test_state().await;
        let mut records: Vec<FlightRecordEntity> =
            (0..8).map(|_| record(10, vec![])).collect();
        records.extend((0..2).map(|_| record(25, vec![])));
        store.seed_flight_records(records);

        let report = period_report(&state, "club_pinetina", StatsPeriod::Week)
            .await
            .unwrap();
        assert_eq!(report.overall.total_flights, 10);
        assert_eq!(report.overall.on_time_percent, 80);
    }

    #[test]
    fn delay_frequency_and_critical_holes() {
        // Hole 7: three of four flights over the 14-minute target.
        let records: Vec<FlightRecordEntity> = vec![
            record(0, vec![timing(7, 900, 840)]),
            record(0, vec![timing(7, 1_000, 840)]),
            record(0, vec![timing(7, 950, 840)]),
            record(0, vec![timing(7, 700, 840)]),
        ];

        let report = aggregate_history(&records);
        let hole = report
            .hole_stats
            .iter()
            .find(|stat| stat.number == 7)
            .unwrap();
        assert_eq!(hole.delay_frequency_percent, 75);
        assert_eq!(hole.target_minutes, 14);
        assert_eq!(report.overall.critical_holes, vec![7]);
    }

    #[test]
    fn critical_holes_are_capped_at_three_worst_first() {
        // Five holes all above the 25% cutoff with distinct frequencies.
        let records: Vec<FlightRecordEntity> = (0..4)
            .map(|i| {
                record(
                    0,
                    (1..=5)
                        .map(|hole| {
                            // Hole h is late in h of the four flights.
                            let late = i < hole;
                            timing(hole as u8, if late { 900 } else { 700 }, 840)
                        })
                        .collect(),
                )
            })
            .collect();

        // Holes 4 and 5 tie at 100%, hole 3 sits at 75%, hole 2 at 50%,
        // hole 1 at exactly 25% and therefore below the cutoff.
        let report = aggregate_history(&records);
        assert_eq!(report.overall.critical_holes, vec![4, 5, 3]);
    }

    #[test]
    fn traffic_rank_requires_more_than_five_samples() {
        let records: Vec<FlightRecordEntity> = (0..6)
            .map(|_| record(0, vec![timing(1, 800, 840), timing(2, 800, 840)]))
            .collect();
        let mut report = aggregate_history(&records);
        assert!(report
            .hole_stats
            .iter()
            .all(|stat| stat.traffic_rank == TrafficRank::High));

        let records: Vec<FlightRecordEntity> = (0..5)
            .map(|_| record(0, vec![timing(1, 800, 840)]))
            .collect();
        report = aggregate_history(&records);
        assert_eq!(report.hole_stats[0].traffic_rank, TrafficRank::Normal);
    }

    #[test]
    fn delay_trend_reflects_the_average_delay() {
        let calm: Vec<FlightRecordEntity> = (0..4).map(|_| record(3, vec![])).collect();
        assert_eq!(aggregate_history(&calm).overall.delay_trend, "Stable");

        let slow: Vec<FlightRecordEntity> = (0..4).map(|_| record(9, vec![])).collect();
        assert_eq!(aggregate_history(&slow).overall.delay_trend, "+9m");
    }

    #[tokio::test]
    async fn empty_history_is_an_explicit_no_data_outcome() {
        let (state, _store) = test_state().await;
        let err = period_report(&state, "club_pinetina", StatsPeriod::Month)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn today_report_reads_the_daily_document() {
        let (state, store) = test_state().await;
        store.seed_daily_aggregate(
            "club_pinetina",
            &super::today_key(),
            DailyAggregateEntity {
                overall: OverallAggregateEntity {
                    avg_round_time: "4h 12m".into(),
                    total_flights: 18,
                    on_time_percent: 72,
                    critical_holes: vec![7, 12],
                    delay_trend: "+7m".into(),
                },
                hole_stats: vec![],
            },
        );

        let report = today_report(&state, "club_pinetina").await.unwrap();
        assert_eq!(report.overall.avg_round_time, "4h 12m");
        assert_eq!(report.overall.total_flights, 18);
    }
}
