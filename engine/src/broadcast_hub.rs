//! C2: the client registry and event fanout.
//!
//! A dedicated writer task per connection (spawned by the Connection
//! Layer, which owns the actual socket) drains a bounded queue owned
//! here. `broadcast` only ever enqueues — a blocked or slow client never
//! delays delivery to anyone else, and an overflowing queue gets the
//! offending connection dropped rather than backpressuring the Hub.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::mpsc;

use protocol::EventEnvelope;

/// Recommended per-client outbound queue depth; overflow disconnects.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 64;

pub type ConnectionId = u64;

struct ConnectionEntry {
    sender: mpsc::Sender<Arc<EventEnvelope>>,
    player_name: Option<String>,
}

#[derive(Default)]
pub struct BroadcastHub {
    connections: Mutex<HashMap<ConnectionId, ConnectionEntry>>,
    next_id: AtomicU64,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers a new connection and returns its id plus the receiving
    /// end of its bounded queue, which the caller's writer task owns.
    pub fn register(&self) -> (ConnectionId, mpsc::Receiver<Arc<EventEnvelope>>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        self.connections.lock().unwrap().insert(
            id,
            ConnectionEntry {
                sender,
                player_name: None,
            },
        );
        (id, receiver)
    }

    /// Associates a connection with the player name it joined as, so
    /// later code (not used by broadcast itself) can look it up.
    pub fn bind_player(&self, id: ConnectionId, player_name: String) {
        if let Some(entry) = self.connections.lock().unwrap().get_mut(&id) {
            entry.player_name = Some(player_name);
        }
    }

    pub fn unregister(&self, id: ConnectionId) {
        self.connections.lock().unwrap().remove(&id);
    }

    pub fn connection_count(&self) -> usize {
        self.connections.lock().unwrap().len()
    }

    /// Enqueues `event` for every registered connection, in the order
    /// this method is invoked — per-client FIFO is guaranteed because
    /// each client has exactly one queue and the Coordinator's
    /// serialization boundary ensures broadcasts are issued in order.
    ///
    /// Disconnects any client whose queue is already full; never blocks
    /// on a slow client.
    pub fn broadcast(&self, event: EventEnvelope) {
        self.broadcast_filtered(event, None);
    }

    /// Like [`Self::broadcast`], but skips `exclude` — used when that
    /// connection is getting its own, differently-shaped copy of the same
    /// logical event via [`Self::send_to`] (e.g. `start_game`'s admin
    /// secret), so it doesn't also receive the public broadcast version.
    pub fn broadcast_except(&self, exclude: ConnectionId, event: EventEnvelope) {
        self.broadcast_filtered(event, Some(exclude));
    }

    fn broadcast_filtered(&self, event: EventEnvelope, exclude: Option<ConnectionId>) {
        let event = Arc::new(event);
        let mut dead = Vec::new();
        {
            let connections = self.connections.lock().unwrap();
            for (&id, entry) in connections.iter() {
                if Some(id) == exclude {
                    continue;
                }
                match entry.sender.try_send(event.clone()) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        tracing::warn!(connection_id = id, "outbound queue overflow, disconnecting");
                        dead.push(id);
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        dead.push(id);
                    }
                }
            }
        }
        if !dead.is_empty() {
            let mut connections = self.connections.lock().unwrap();
            for id in dead {
                // Dropping the sender closes the channel; the writer task
                // drains whatever is already queued, then exits and closes
                // the socket. The Hub itself never blocks on this.
                connections.remove(&id);
            }
        }
    }

    /// Sends `event` to exactly one connection (used for `player_reconnected`
    /// snapshots and command-failure `error` replies). Silently drops the
    /// event if the connection is already gone or its queue is full — a
    /// reconnecting/errored client will simply not see it, which is no
    /// worse than the at-most-once guarantee broadcasts already give.
    pub fn send_to(&self, id: ConnectionId, event: EventEnvelope) {
        let connections = self.connections.lock().unwrap();
        if let Some(entry) = connections.get(&id) {
            let _ = entry.sender.try_send(Arc::new(event));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::{EventEnvelope, EventPayload};

    fn sample_game_reset() -> EventEnvelope {
        EventEnvelope::new(EventPayload::GameReset(protocol::GameResetData {
            admin_secret: None,
        }))
    }

    #[tokio::test]
    async fn broadcast_reaches_all_registered_connections() {
        let hub = BroadcastHub::new();
        let (id_a, mut rx_a) = hub.register();
        let (id_b, mut rx_b) = hub.register();

        hub.broadcast(sample_game_reset());

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
        assert_eq!(hub.connection_count(), 2);
        drop((id_a, id_b));
    }

    #[tokio::test]
    async fn full_queue_disconnects_only_that_client() {
        let hub = BroadcastHub::new();
        let (slow_id, slow_rx) = hub.register();
        let (fast_id, mut fast_rx) = hub.register();
        // Don't drain slow_rx; fill its queue past capacity.
        for _ in 0..OUTBOUND_QUEUE_CAPACITY + 1 {
            hub.broadcast(sample_game_reset());
        }
        assert!(fast_rx.try_recv().is_ok());
        assert_eq!(hub.connection_count(), 1);
        assert!(hub.connections.lock().unwrap().get(&slow_id).is_none());
        drop(slow_rx);
        let _ = fast_id;
    }

    #[tokio::test]
    async fn unregister_removes_connection() {
        let hub = BroadcastHub::new();
        let (id, _rx) = hub.register();
        hub.unregister(id);
        assert_eq!(hub.connection_count(), 0);
    }
}
