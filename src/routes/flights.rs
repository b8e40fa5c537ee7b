use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::flight::{FlightSummary, StartFlightRequest},
    error::AppError,
    services::round_service,
    state::SharedState,
};

/// Routes driving the round lifecycle of a flight.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/flights", post(start_flight))
        .route("/flights/{id}", get(flight_snapshot))
        .route("/flights/{id}/stop", post(request_stop))
        .route("/flights/{id}/confirm-stop", post(confirm_stop))
}

/// Confirm a flight setup: register the flight and start its round.
#[utoipa::path(
    post,
    path = "/flights",
    tag = "flights",
    request_body = StartFlightRequest,
    responses(
        (status = 200, description = "Round started", body = FlightSummary),
        (status = 409, description = "A round with this session code is already running")
    )
)]
pub async fn start_flight(
    State(state): State<SharedState>,
    Json(payload): Json<StartFlightRequest>,
) -> Result<Json<FlightSummary>, AppError> {
    payload.validate()?;
    let summary = round_service::start_flight(&state, payload).await?;
    Ok(Json(summary))
}

/// Snapshot the current state of a flight.
#[utoipa::path(
    get,
    path = "/flights/{id}",
    tag = "flights",
    params(("id" = Uuid, Path, description = "Flight identifier")),
    responses(
        (status = 200, description = "Flight snapshot", body = FlightSummary),
        (status = 404, description = "Flight is not registered")
    )
)]
pub async fn flight_snapshot(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FlightSummary>, AppError> {
    let summary = round_service::flight_snapshot(&state, id).await?;
    Ok(Json(summary))
}

/// Request a stop; the round moves to `closing` pending confirmation.
#[utoipa::path(
    post,
    path = "/flights/{id}/stop",
    tag = "flights",
    params(("id" = Uuid, Path, description = "Flight identifier")),
    responses(
        (status = 200, description = "Stop requested", body = FlightSummary),
        (status = 409, description = "Round is not in a stoppable phase")
    )
)]
pub async fn request_stop(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FlightSummary>, AppError> {
    let summary = round_service::request_stop(&state, id).await?;
    Ok(Json(summary))
}

/// Confirm the stop: persist the close record and complete the round.
#[utoipa::path(
    post,
    path = "/flights/{id}/confirm-stop",
    tag = "flights",
    params(("id" = Uuid, Path, description = "Flight identifier")),
    responses(
        (status = 200, description = "Round completed", body = FlightSummary),
        (status = 409, description = "Round is not awaiting confirmation"),
        (status = 503, description = "Close record could not be persisted; round stays in closing")
    )
)]
pub async fn confirm_stop(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FlightSummary>, AppError> {
    let summary = round_service::confirm_stop(&state, id).await?;
    Ok(Json(summary))
}
