//! Shutdown coordination for the proxy.

use tokio::sync::broadcast;

/// Fan-out shutdown signal.
///
/// The server subscribes before it starts serving; `trigger` tells every
/// subscriber to stop. Dropping the coordinator also wakes subscribers.
#[derive(Debug)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Signal every subscriber. Safe to call more than once.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
