use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for PlayTrack Pace Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::player_stream,
        crate::routes::sse::monitor_stream,
        crate::routes::flights::start_flight,
        crate::routes::flights::flight_snapshot,
        crate::routes::flights::request_stop,
        crate::routes::flights::confirm_stop,
        crate::routes::telemetry::report_position,
        crate::routes::telemetry::hole_entered,
        crate::routes::telemetry::hole_exited,
        crate::routes::pace_config::get_pace_config,
        crate::routes::pace_config::save_pace_config,
        crate::routes::analytics::today_report,
        crate::routes::analytics::period_report,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::flight::StartFlightRequest,
            crate::dto::flight::PlayerInput,
            crate::dto::flight::FlightSummary,
            crate::dto::flight::RoundPhaseDto,
            crate::dto::flight::HoleRecordDto,
            crate::dto::telemetry::PositionReport,
            crate::dto::telemetry::IngestAck,
            crate::dto::telemetry::IngestOutcome,
            crate::dto::telemetry::HoleEventRequest,
            crate::dto::pace::PaceConfigDto,
            crate::dto::pace::PaceSettingsDto,
            crate::dto::pace::HoleTargetDto,
            crate::dto::analytics::PaceReport,
            crate::dto::analytics::OverallStats,
            crate::dto::analytics::HoleStat,
            crate::dto::analytics::TrafficRank,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "flights", description = "Round lifecycle operations"),
        (name = "telemetry", description = "Position and hole boundary ingestion"),
        (name = "pace-config", description = "Per-course pace configuration"),
        (name = "analytics", description = "Club pace reports"),
    )
)]
pub struct ApiDoc;
