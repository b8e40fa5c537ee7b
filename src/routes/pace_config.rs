use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use validator::Validate;

use crate::{
    dto::pace::PaceConfigDto,
    error::AppError,
    services::pace_config_service,
    state::SharedState,
};

/// Routes managing per-course pace configuration.
pub fn router() -> Router<SharedState> {
    Router::new().route(
        "/clubs/{club_id}/courses/{course_id}/pace-config",
        get(get_pace_config).put(save_pace_config),
    )
}

/// Fetch the stored pace configuration for a course.
#[utoipa::path(
    get,
    path = "/clubs/{club_id}/courses/{course_id}/pace-config",
    tag = "pace-config",
    params(
        ("club_id" = String, Path, description = "Club identifier"),
        ("course_id" = String, Path, description = "Course identifier")
    ),
    responses(
        (status = 200, description = "Pace configuration", body = PaceConfigDto),
        (status = 404, description = "No configuration stored for this course")
    )
)]
pub async fn get_pace_config(
    State(state): State<SharedState>,
    Path((club_id, course_id)): Path<(String, String)>,
) -> Result<Json<PaceConfigDto>, AppError> {
    let config = pace_config_service::get_config(&state, &club_id, &course_id).await?;
    Ok(Json(config.into()))
}

/// Replace the pace configuration for a course.
#[utoipa::path(
    put,
    path = "/clubs/{club_id}/courses/{course_id}/pace-config",
    tag = "pace-config",
    params(
        ("club_id" = String, Path, description = "Club identifier"),
        ("course_id" = String, Path, description = "Course identifier")
    ),
    request_body = PaceConfigDto,
    responses(
        (status = 204, description = "Configuration saved"),
        (status = 400, description = "Thresholds are out of range or inverted")
    )
)]
pub async fn save_pace_config(
    State(state): State<SharedState>,
    Path((club_id, course_id)): Path<(String, String)>,
    Json(payload): Json<PaceConfigDto>,
) -> Result<axum::http::StatusCode, AppError> {
    payload.validate()?;
    pace_config_service::save_config(&state, &club_id, &course_id, payload.into()).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
