use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::{info, warn};

use crate::{
    dto::sse::ServerEvent,
    services::sse_service::{self, StreamKind},
    state::SharedState,
};

/// Stream realtime events to player devices: tracking status, capture
/// signals, and player-facing pace alerts.
#[utoipa::path(
    get,
    path = "/sse/player",
    tag = "sse",
    responses((status = 200, description = "Player SSE stream", content_type = "text/event-stream", body = String))
)]
pub async fn player_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe(&state, StreamKind::Player);
    info!("New player SSE connection");
    broadcast_handshake(&state, StreamKind::Player).await;
    sse_service::to_sse_stream(receiver, StreamKind::Player)
}

/// Stream realtime events to the monitoring UI: hole records, marshall
/// alerts, and audio alert signals.
#[utoipa::path(
    get,
    path = "/sse/monitor",
    tag = "sse",
    responses((status = 200, description = "Monitor SSE stream", content_type = "text/event-stream", body = String))
)]
pub async fn monitor_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe(&state, StreamKind::Monitor);
    info!("New monitor SSE connection");
    broadcast_handshake(&state, StreamKind::Monitor).await;
    sse_service::to_sse_stream(receiver, StreamKind::Monitor)
}

async fn broadcast_handshake(state: &SharedState, kind: StreamKind) {
    let payload = sse_service::handshake(state, kind).await;
    match ServerEvent::json(Some("handshake".to_string()), &payload) {
        Ok(event) => match kind {
            StreamKind::Player => state.player_sse().broadcast(event),
            StreamKind::Monitor => state.monitor_sse().broadcast(event),
        },
        Err(err) => warn!(error = %err, "failed to serialize SSE handshake"),
    }
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/sse/player", get(player_stream))
        .route("/sse/monitor", get(monitor_stream))
}
