//! Dashboard fan-out
//!
//! The engine emits one text line per state change. How the line reaches
//! viewers is up to the [`Broadcaster`] it was built with.

use tokio::sync::broadcast;
use tracing::trace;

/// Sends a line to every connected dashboard viewer
pub trait Broadcaster: Send + Sync {
    fn send_to_all(&self, line: &str);
}

/// Broadcaster backed by a tokio broadcast channel
///
/// Viewers [`subscribe`](ChannelBroadcaster::subscribe) and receive every
/// line sent afterwards. A viewer that falls more than `capacity` lines
/// behind skips the oldest ones.
#[derive(Debug, Clone)]
pub struct ChannelBroadcaster {
    tx: broadcast::Sender<String>,
}

impl ChannelBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    pub fn viewer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Broadcaster for ChannelBroadcaster {
    fn send_to_all(&self, line: &str) {
        // No viewers is not an error
        if self.tx.send(line.to_string()).is_err() {
            trace!("No dashboard viewers for: {}", line);
        }
    }
}
