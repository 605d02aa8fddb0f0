use crossbeam_channel::{bounded, Sender, TrySendError};
use tracing::{trace, warn};

use super::events::{StateChange, WatcherId};
use super::stream::StateWatcher;

#[derive(Debug)]
struct WatcherEntry {
    id: WatcherId,
    tx: Sender<StateChange>,
}

/// Owns the sending side of every watcher of one store.
#[derive(Debug, Default)]
pub(crate) struct WatchHub {
    watchers: Vec<WatcherEntry>,
    dropped: u64,
}

impl WatchHub {
    /// Creates a hub with no watchers.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a watcher with a bounded buffer.
    pub(crate) fn subscribe(&mut self, capacity: usize) -> StateWatcher {
        let id = WatcherId::new();
        let (tx, rx) = bounded(capacity.max(1));
        self.watchers.push(WatcherEntry { id, tx });
        StateWatcher::new(id, rx)
    }

    /// Delivers `change` to every live watcher without blocking.
    pub(crate) fn publish(&mut self, change: &StateChange) {
        let mut dropped = 0u64;
        self.watchers.retain(|w| match w.tx.try_send(change.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                dropped += 1;
                true
            }
            Err(TrySendError::Disconnected(_)) => {
                trace!(watcher = %w.id, "pruned disconnected watcher");
                false
            }
        });
        if dropped > 0 {
            warn!(
                revision = change.revision,
                dropped, "watcher buffers full; change events dropped"
            );
            self.dropped += dropped;
        }
    }

    /// Number of live watchers as of the last fan-out.
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.watchers.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }

    /// Total change events dropped because a watcher's buffer was full.
    #[must_use]
    pub(crate) const fn dropped(&self) -> u64 {
        self.dropped
    }

    #[cfg(test)]
    fn contains(&self, id: WatcherId) -> bool {
        self.watchers.iter().any(|w| w.id == id)
    }
}
