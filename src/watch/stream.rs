use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};

use crate::error::{FacetError, FacetResult};

use super::events::{StateChange, WatcherId};

/// A subscription to state changes of one store.
///
/// Dropping the watcher unsubscribes it; the store prunes it on the next
/// change. Once the store itself is dropped, receives report
/// [`FacetError::Disconnected`].
#[derive(Debug)]
pub struct StateWatcher {
    id: WatcherId,
    rx: Receiver<StateChange>,
}

impl StateWatcher {
    pub(crate) fn new(id: WatcherId, rx: Receiver<StateChange>) -> Self {
        Self { id, rx }
    }

    /// The id backing this watcher.
    #[must_use]
    pub const fn id(&self) -> WatcherId {
        self.id
    }

    /// Receive the next change (blocking).
    pub fn recv(&self) -> FacetResult<StateChange> {
        self.rx.recv().map_err(|_| disconnected())
    }

    /// Receive the next change if one is queued.
    pub fn try_recv(&self) -> FacetResult<Option<StateChange>> {
        match self.rx.try_recv() {
            Ok(change) => Ok(Some(change)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(disconnected()),
        }
    }

    /// Receive the next change with a timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> FacetResult<StateChange> {
        self.rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => FacetError::Timeout {
                duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            },
            RecvTimeoutError::Disconnected => disconnected(),
        })
    }

    /// Drain every queued change, oldest first.
    pub fn drain(&self) -> Vec<StateChange> {
        self.rx.try_iter().collect()
    }
}

fn disconnected() -> FacetError {
    FacetError::Disconnected {
        path: "state_watcher".to_string(),
    }
}
