//! Cancellation shared between the session and an analysis worker.

use std::sync::{Arc, Mutex};

/// A one-shot cancellation flag.
///
/// The worker delivers each update through
/// [`run_unless_cancelled`](CancelToken::run_unless_cancelled), which holds the
/// lock for the whole check-and-send. Once [`cancel`](CancelToken::cancel)
/// returns, no further update can be delivered.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<Mutex<bool>>,
}

impl CancelToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the token, waiting for any delivery in progress to finish.
    pub fn cancel(&self) {
        *self.cancelled.lock().expect("cancel token lock poisoned") = true;
    }

    /// Return `true` once [`cancel`](CancelToken::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.lock().expect("cancel token lock poisoned")
    }

    /// Run `f` while holding the lock, unless the token is cancelled.
    pub fn run_unless_cancelled<T>(&self, f: impl FnOnce() -> T) -> Option<T> {
        let cancelled = self.cancelled.lock().expect("cancel token lock poisoned");
        if *cancelled { None } else { Some(f()) }
    }
}
