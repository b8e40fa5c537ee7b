use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::analytics::PaceReport,
    error::AppError,
    services::analytics_service::{self, StatsPeriod},
    state::SharedState,
};

/// Routes serving club pace analytics.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/clubs/{club_id}/pace-report/today", get(today_report))
        .route("/clubs/{club_id}/pace-report/{period}", get(period_report))
}

/// Today's pace report, served from the pre-aggregated daily document.
#[utoipa::path(
    get,
    path = "/clubs/{club_id}/pace-report/today",
    tag = "analytics",
    params(("club_id" = String, Path, description = "Club identifier")),
    responses(
        (status = 200, description = "Daily pace report", body = PaceReport),
        (status = 404, description = "No pace data recorded today")
    )
)]
pub async fn today_report(
    State(state): State<SharedState>,
    Path(club_id): Path<String>,
) -> Result<Json<PaceReport>, AppError> {
    let report = analytics_service::today_report(&state, &club_id).await?;
    Ok(Json(report))
}

/// Pace report aggregated over a trailing window (`week` or `month`).
#[utoipa::path(
    get,
    path = "/clubs/{club_id}/pace-report/{period}",
    tag = "analytics",
    params(
        ("club_id" = String, Path, description = "Club identifier"),
        ("period" = String, Path, description = "Reporting window: `week` or `month`")
    ),
    responses(
        (status = 200, description = "Aggregated pace report", body = PaceReport),
        (status = 400, description = "Unknown reporting period"),
        (status = 404, description = "No flights recorded in the period")
    )
)]
pub async fn period_report(
    State(state): State<SharedState>,
    Path((club_id, period)): Path<(String, String)>,
) -> Result<Json<PaceReport>, AppError> {
    let period = match period.as_str() {
        "week" => StatsPeriod::Week,
        "month" => StatsPeriod::Month,
        other => {
            return Err(AppError::BadRequest(format!(
                "unknown reporting period `{other}` (expected `week` or `month`)"
            )));
        }
    };

    let report = analytics_service::period_report(&state, &club_id, period).await?;
    Ok(Json(report))
}
