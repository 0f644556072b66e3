//! SSE broadcaster for real-time client updates

use axum::{
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};

use super::events::PulseEvent;

/// Manages client connections and event distribution
#[derive(Clone)]
pub struct SseBroadcaster {
    tx: broadcast::Sender<PulseEvent>,
}

impl SseBroadcaster {
    /// Create a new broadcaster buffering up to `capacity` events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        info!("SSE broadcaster initialized with capacity {}", capacity);
        Self { tx }
    }

    /// Broadcast an event, ignoring if no clients are connected
    pub fn broadcast_lossy(&self, event: PulseEvent) {
        match self.tx.send(event) {
            Ok(count) => debug!("Broadcast event to {} clients", count),
            Err(_) => debug!("No SSE clients connected, event dropped"),
        }
    }

    /// Get current number of connected clients
    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Create an SSE stream for a new client connection
    pub fn subscribe_stream(&self) -> impl Stream<Item = Result<Event, Infallible>> {
        let rx = self.tx.subscribe();
        let stream = BroadcastStream::new(rx);

        stream.filter_map(|result| async move {
            match result {
                Ok(pulse_event) => {
                    let event = Event::default()
                        .event(pulse_event.name())
                        .json_data(&pulse_event)
                        .ok();
                    event.map(Ok)
                }
                Err(e) => {
                    // Lagged receiver; drop the error and keep the stream alive
                    warn!("SSE client error: {:?}", e);
                    None
                }
            }
        })
    }

    /// Build the SSE response for GET /api/events
    pub fn handle_sse_connection(&self) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
        info!(
            "New SSE client connected, total clients: {}",
            self.client_count()
        );

        Sse::new(self.subscribe_stream()).keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(30))
                .text("keep-alive"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sse::SessionChange;
    use uuid::Uuid;

    #[tokio::test]
    async fn broadcast_without_clients_is_lossy() {
        let broadcaster = SseBroadcaster::new(16);
        assert_eq!(broadcaster.client_count(), 0);
        broadcaster.broadcast_lossy(PulseEvent::SessionChanged {
            session_id: Uuid::new_v4(),
            change: SessionChange::Created,
        });
    }

    #[tokio::test]
    async fn subscriber_receives_broadcast_event() {
        let broadcaster = SseBroadcaster::new(16);
        let stream = broadcaster.subscribe_stream();
        tokio::pin!(stream);

        broadcaster.broadcast_lossy(PulseEvent::SessionChanged {
            session_id: Uuid::nil(),
            change: SessionChange::Updated,
        });

        let event = stream.next().await;
        assert!(event.is_some());
    }
}
