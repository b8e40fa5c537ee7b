use tokio::sync::broadcast;

use crate::dto::sse::ServerEvent;

/// SSE sub-state carved out from [`AppState`](super::AppState): one hub for
/// the player-facing stream and one for the marshall/monitor stream.
pub struct SseState {
    player: SseHub,
    monitor: SseHub,
}

impl SseState {
    /// Build the SSE sub-tree with per-stream channel capacities.
    pub fn new(player_capacity: usize, monitor_capacity: usize) -> Self {
        Self {
            player: SseHub::new(player_capacity),
            monitor: SseHub::new(monitor_capacity),
        }
    }

    /// Hub for events consumed by player devices (tracking status, capture
    /// signals, player pace alerts).
    pub fn player(&self) -> &SseHub {
        &self.player
    }

    /// Hub for events consumed by the monitoring UI (hole records, marshall
    /// alerts, audio alert signals).
    pub fn monitor(&self) -> &SseHub {
        &self.monitor
    }
}

/// Broadcast hub wrapper used by the SSE services.
#[derive(Clone)]
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Construct a new hub backed by a Tokio broadcast channel.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}
