use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        flight::HoleRecordDto,
        telemetry::{HoleEventRequest, IngestAck, PositionReport},
    },
    error::AppError,
    services::{telemetry_service, timing_service},
    state::SharedState,
};

/// Routes receiving raw telemetry from player devices.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/flights/{id}/position", post(report_position))
        .route("/flights/{id}/holes/enter", post(hole_entered))
        .route("/flights/{id}/holes/exit", post(hole_exited))
}

/// Ingest one GPS sample. The acknowledgement carries the sample's
/// disposition and the re-read round phase.
#[utoipa::path(
    post,
    path = "/flights/{id}/position",
    tag = "telemetry",
    params(("id" = Uuid, Path, description = "Flight identifier")),
    request_body = PositionReport,
    responses(
        (status = 200, description = "Sample acknowledged", body = IngestAck),
        (status = 404, description = "Flight is not registered")
    )
)]
pub async fn report_position(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PositionReport>,
) -> Result<Json<IngestAck>, AppError> {
    payload.validate()?;
    let ack = telemetry_service::ingest_position(&state, id, payload).await?;
    Ok(Json(ack))
}

/// Record an "enter hole" boundary crossing.
#[utoipa::path(
    post,
    path = "/flights/{id}/holes/enter",
    tag = "telemetry",
    params(("id" = Uuid, Path, description = "Flight identifier")),
    request_body = HoleEventRequest,
    responses(
        (status = 204, description = "Entry recorded"),
        (status = 409, description = "Round is not active")
    )
)]
pub async fn hole_entered(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<HoleEventRequest>,
) -> Result<axum::http::StatusCode, AppError> {
    payload.validate()?;
    timing_service::hole_entered(&state, id, payload).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

/// Record an "exit hole" boundary crossing and close the hole timing.
/// Returns the recorded timing, or nothing when the exit matched no open
/// entry.
#[utoipa::path(
    post,
    path = "/flights/{id}/holes/exit",
    tag = "telemetry",
    params(("id" = Uuid, Path, description = "Flight identifier")),
    request_body = HoleEventRequest,
    responses(
        (status = 200, description = "Timing recorded, or null when the exit matched no open entry", body = HoleRecordDto),
        (status = 409, description = "Round is not active")
    )
)]
pub async fn hole_exited(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<HoleEventRequest>,
) -> Result<Json<Option<HoleRecordDto>>, AppError> {
    payload.validate()?;
    let record = timing_service::hole_exited(&state, id, payload).await?;
    Ok(Json(record))
}
