use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{
    dto::sse::{Handshake, ServerEvent},
    state::SharedState,
};

/// Identifies the target SSE stream for connection logging.
#[derive(Clone, Copy)]
pub enum StreamKind {
    /// Player devices: tracking status, capture signals, player alerts.
    Player,
    /// Monitoring UI: hole records, marshall alerts, audio alert signals.
    Monitor,
}

impl StreamKind {
    fn label(self) -> &'static str {
        match self {
            StreamKind::Player => "player",
            StreamKind::Monitor => "monitor",
        }
    }
}

/// Subscribe to one of the SSE streams.
pub fn subscribe(state: &SharedState, kind: StreamKind) -> broadcast::Receiver<ServerEvent> {
    match kind {
        StreamKind::Player => state.player_sse().subscribe(),
        StreamKind::Monitor => state.monitor_sse().subscribe(),
    }
}

/// Build the handshake payload sent to a freshly connected client.
pub async fn handshake(state: &SharedState, kind: StreamKind) -> Handshake {
    Handshake {
        stream: kind.label().to_string(),
        message: format!("subscribed to the {} stream", kind.label()),
        degraded: state.is_degraded().await,
    }
}

/// Convert a broadcast receiver into an SSE response, forwarding events and
/// cleaning up once the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    kind: StreamKind,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    // forwarder task: reads from broadcast and pushes into mpsc
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            let mut event = Event::default().data(payload.data);
                            if let Some(name) = payload.event {
                                event = event.event(name);
                            }

                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(_)) => {
                            // Skip lagged messages but keep the stream alive.
                            continue;
                        }
                    }
                }
            }
        }

        tracing::info!(stream = kind.label(), "SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
