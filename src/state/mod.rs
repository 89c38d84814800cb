//! Per-screen state holders.
//!
//! Every holder owns a snapshot, a `loading` flag and an optional error. Client
//! calls are spawned on the tokio runtime and report back through an unbounded
//! channel. Each request is tagged with a sequence number and only the outcome of
//! the most recently issued request is applied; older ones are dropped.

use std::future::Future;

use log::debug;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

pub mod agents;
pub mod chat;
pub mod knowledge;

pub use agents::{AgentsEvent, AgentsState};
pub use chat::{ChatEvent, ChatState};
pub use knowledge::{KnowledgeEvent, KnowledgeState};

/// Result of a spawned request: the event to apply, or an error message.
pub type Outcome<T> = Result<T, String>;

struct Tagged<T> {
    seq: u64,
    outcome: Outcome<T>,
}

/// Loading/error bookkeeping and request sequencing shared by all holders.
pub struct StateCore<T> {
    loading: bool,
    error: Option<String>,
    issued: u64,
    events_tx: UnboundedSender<Tagged<T>>,
    events_rx: UnboundedReceiver<Tagged<T>>,
}

impl<T: Send + 'static> Default for StateCore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> StateCore<T> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            loading: false,
            error: None,
            issued: 0,
            events_tx: tx,
            events_rx: rx,
        }
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Number of requests issued so far.
    pub fn issued(&self) -> u64 {
        self.issued
    }

    /// Starts a request and returns its sequence number.
    ///
    /// The task runs in its own spawned task so that a panic inside it surfaces as
    /// an error outcome instead of leaving the holder loading forever.
    pub fn dispatch<F>(&mut self, task: F) -> u64
    where
        F: Future<Output = Outcome<T>> + Send + 'static,
    {
        self.issued += 1;
        let seq = self.issued;
        self.loading = true;
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = match tokio::spawn(task).await {
                Ok(outcome) => outcome,
                Err(err) => Err(format!("background task failed: {err}")),
            };
            let _ = tx.send(Tagged { seq, outcome });
        });
        seq
    }

    /// Non-blocking: the next outcome that should be applied, if one has arrived.
    pub fn try_next(&mut self) -> Option<Outcome<T>> {
        while let Ok(tagged) = self.events_rx.try_recv() {
            if let Some(outcome) = self.accept(tagged) {
                return Some(outcome);
            }
        }
        None
    }

    /// Waits for the outcome of the latest request. Returns `None` when nothing is
    /// in flight.
    pub async fn next(&mut self) -> Option<Outcome<T>> {
        while self.loading {
            let tagged = self.events_rx.recv().await?;
            if let Some(outcome) = self.accept(tagged) {
                return Some(outcome);
            }
        }
        None
    }

    fn accept(&mut self, tagged: Tagged<T>) -> Option<Outcome<T>> {
        if tagged.seq != self.issued {
            debug!(
                "dropping stale response #{} (latest is #{})",
                tagged.seq, self.issued
            );
            return None;
        }
        self.loading = false;
        match &tagged.outcome {
            Ok(_) => self.error = None,
            Err(message) => self.error = Some(message.clone()),
        }
        Some(tagged.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn latest_issued_request_wins_even_if_it_finishes_first() {
        let mut core: StateCore<&'static str> = StateCore::new();
        let (first_tx, first_rx) = oneshot::channel::<()>();
        let (second_tx, second_rx) = oneshot::channel::<()>();

        core.dispatch(async move {
            let _ = first_rx.await;
            Ok::<_, String>("first")
        });
        core.dispatch(async move {
            let _ = second_rx.await;
            Ok::<_, String>("second")
        });
        assert!(core.loading());

        second_tx.send(()).unwrap();
        assert_eq!(core.next().await, Some(Ok("second")));
        assert!(!core.loading());

        first_tx.send(()).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(core.try_next(), None);
        assert_eq!(core.next().await, None);
    }

    #[tokio::test]
    async fn stale_response_arriving_first_is_skipped() {
        let mut core: StateCore<u32> = StateCore::new();
        let (first_tx, first_rx) = oneshot::channel::<()>();
        let (second_tx, second_rx) = oneshot::channel::<()>();
        core.dispatch(async move {
            let _ = first_rx.await;
            Ok::<u32, String>(1)
        });
        core.dispatch(async move {
            let _ = second_rx.await;
            Ok::<u32, String>(2)
        });

        first_tx.send(()).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(core.try_next(), None);
        assert!(core.loading());

        second_tx.send(()).unwrap();
        assert_eq!(core.next().await, Some(Ok(2)));
    }

    #[tokio::test]
    async fn errors_are_recorded_and_cleared_by_success() {
        let mut core: StateCore<u32> = StateCore::new();
        core.dispatch(async { Err::<u32, String>("kaputt".to_string()) });
        assert_eq!(core.next().await, Some(Err("kaputt".to_string())));
        assert_eq!(core.error(), Some("kaputt"));

        core.dispatch(async { Ok::<u32, String>(7) });
        assert_eq!(core.next().await, Some(Ok(7)));
        assert_eq!(core.error(), None);
    }

    #[tokio::test]
    async fn panicking_task_becomes_an_error() {
        let mut core: StateCore<u32> = StateCore::new();
        core.dispatch(async {
            let missing: Option<u32> = None;
            Ok::<u32, String>(missing.expect("boom"))
        });
        let outcome = core.next().await.unwrap();
        assert!(outcome.unwrap_err().contains("background task failed"));
        assert!(!core.loading());
    }
}
