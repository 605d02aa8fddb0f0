//! Loader worker for the one-shot entity load.
//!
//! The source runs on its own thread and reports through a single-slot
//! channel. The store only ever polls or waits on the receiving end, so its
//! own state is never touched off the owning thread.

use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, TryRecvError};

use crate::error::{EntityLoadError, FacetError, FacetResult};
use crate::source::EntitySource;

pub(crate) type LoadOutcome<E> = Result<Vec<E>, EntityLoadError>;

/// State of an in-flight load when polled.
pub(crate) enum LoadPoll<E> {
    Waiting,
    Done(LoadOutcome<E>),
}

/// Receiving end of an in-flight load.
pub(crate) struct LoadTask<E> {
    rx: Receiver<LoadOutcome<E>>,
}

impl<E: Send + 'static> LoadTask<E> {
    pub(crate) fn spawn<S>(source: S) -> FacetResult<Self>
    where
        S: EntitySource<E> + 'static,
    {
        let (tx, rx) = bounded::<LoadOutcome<E>>(1);
        thread::Builder::new()
            .name("kyrofacet-loader".to_string())
            .spawn(move || {
                // The store may be gone by now; nothing left to report to.
                let _ = tx.send(source.load_entities());
            })
            .map_err(|e| FacetError::internal(format!("failed to spawn entity loader: {e}")))?;
        Ok(Self { rx })
    }
}

impl<E> LoadTask<E> {
    pub(crate) fn poll(&self) -> LoadPoll<E> {
        match self.rx.try_recv() {
            Ok(outcome) => LoadPoll::Done(outcome),
            Err(TryRecvError::Empty) => LoadPoll::Waiting,
            Err(TryRecvError::Disconnected) => LoadPoll::Done(Err(worker_lost())),
        }
    }

    pub(crate) fn wait(&self, timeout: Duration) -> FacetResult<LoadOutcome<E>> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => Ok(outcome),
            Err(RecvTimeoutError::Timeout) => Err(FacetError::Timeout {
                duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
            Err(RecvTimeoutError::Disconnected) => Ok(Err(worker_lost())),
        }
    }
}

// A worker that dies without reporting (e.g. the source panicked) counts as
// a failed load.
fn worker_lost() -> EntityLoadError {
    EntityLoadError::new("entity loader exited without reporting a result")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawned_load_reports_entities() {
        let task = LoadTask::spawn(|| -> LoadOutcome<u32> { Ok(vec![1, 2]) }).unwrap();
        let outcome = task.wait(Duration::from_secs(5)).unwrap();
        assert_eq!(outcome.unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_spawned_load_reports_error() {
        let task =
            LoadTask::spawn(|| -> LoadOutcome<u32> { Err(EntityLoadError::new("503")) }).unwrap();
        let outcome = task.wait(Duration::from_secs(5)).unwrap();
        assert_eq!(outcome.unwrap_err().message(), "503");
    }

    #[test]
    fn test_panicking_source_counts_as_failure() {
        let task = LoadTask::spawn(|| -> LoadOutcome<u32> { panic!("source blew up") }).unwrap();
        let outcome = task.wait(Duration::from_secs(5)).unwrap();
        assert!(outcome.unwrap_err().message().contains("without reporting"));
    }

    #[test]
    fn test_wait_times_out() {
        let (gate_tx, gate_rx) = bounded::<()>(0);
        let task = LoadTask::spawn(move || -> LoadOutcome<u32> {
            let _ = gate_rx.recv();
            Ok(Vec::new())
        })
        .unwrap();

        let err = task.wait(Duration::from_millis(20)).unwrap_err();
        assert!(err.is_timeout());
        assert!(matches!(task.poll(), LoadPoll::Waiting));

        drop(gate_tx);
        let outcome = task.wait(Duration::from_secs(5)).unwrap();
        assert!(outcome.unwrap().is_empty());
    }
}
