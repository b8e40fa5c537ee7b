use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::sse::{CaptureSignal, ServerEvent},
    state::SseHub,
};

const EVENT_CAPTURE_START: &str = "capture.start";
const EVENT_CAPTURE_STOP: &str = "capture.stop";

/// Port to the physical location capture service running on player devices.
///
/// Start/stop signals are fire-and-forget: the capture guard on the flight
/// tracker ensures each transition issues at most one native call, so
/// implementations never have to deduplicate.
pub trait CaptureControl: Send + Sync {
    /// Signal the device to start background location capture.
    fn start(&self, flight_id: Uuid);
    /// Signal the device to stop background location capture.
    fn stop(&self, flight_id: Uuid);
}

/// Default capture control: signals devices over the player SSE stream.
pub struct SseCaptureControl {
    hub: SseHub,
}

impl SseCaptureControl {
    /// Build a capture control that broadcasts on the given hub.
    pub fn new(hub: SseHub) -> Self {
        Self { hub }
    }

    fn signal(&self, event: &str, flight_id: Uuid) {
        match ServerEvent::json(Some(event.to_string()), &CaptureSignal { flight_id }) {
            Ok(payload) => self.hub.broadcast(payload),
            Err(err) => warn!(event, %flight_id, error = %err, "failed to serialize capture signal"),
        }
    }
}

impl CaptureControl for SseCaptureControl {
    fn start(&self, flight_id: Uuid) {
        self.signal(EVENT_CAPTURE_START, flight_id);
    }

    fn stop(&self, flight_id: Uuid) {
        self.signal(EVENT_CAPTURE_STOP, flight_id);
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;

    /// Counts native start/stop signals without any side channel.
    #[derive(Default)]
    pub struct CountingCapture {
        starts: AtomicU64,
        stops: AtomicU64,
    }

    impl CountingCapture {
        pub fn starts(&self) -> u64 {
            self.starts.load(Ordering::SeqCst)
        }

        pub fn stops(&self) -> u64 {
            self.stops.load(Ordering::SeqCst)
        }
    }

    impl CaptureControl for CountingCapture {
        fn start(&self, _flight_id: Uuid) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn stop(&self, _flight_id: Uuid) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }
}
