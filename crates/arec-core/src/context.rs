//! Cancellation and deadlines for collaborator calls
//!
//! A single [`Shutdown`] handle exists per process. Every bootstrap attempt and
//! every reconciliation cycle derives a [`CallContext`] from its listener; the
//! context bounds each collaborator future by a deadline and by the shutdown
//! signal, and attaches the caller's tracing span to it.

use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{Instrument, Span};

/// Owner side of the process-wide cancellation signal
///
/// Dropping the handle counts as triggering it.
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    /// Create a new signal and its first listener
    pub fn new() -> (Self, ShutdownListener) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, ShutdownListener { rx })
    }

    /// Fire the signal. Idempotent.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Create another listener
    pub fn listener(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.tx.subscribe(),
        }
    }
}

/// Listener side of the cancellation signal
#[derive(Debug, Clone)]
pub struct ShutdownListener {
    rx: watch::Receiver<bool>,
}

impl ShutdownListener {
    /// True once the signal fired or its owner went away
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolve once the signal fires. Cancellation safe.
    pub async fn cancelled(&mut self) {
        // An Err here means the sender was dropped, which also ends the wait.
        let _ = self.rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// Deadline, cancellation and tracing span for one unit of work
#[derive(Debug, Clone)]
pub struct CallContext {
    shutdown: ShutdownListener,
    timeout: Duration,
    deadline: Instant,
    span: Span,
}

impl CallContext {
    /// Start a context whose deadline is `timeout` from now
    pub fn new(shutdown: &ShutdownListener, timeout: Duration, span: Span) -> Self {
        Self {
            shutdown: shutdown.clone(),
            timeout,
            deadline: Instant::now() + timeout,
            span,
        }
    }

    /// Time left before the deadline
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Run `fut` under this context
    ///
    /// Returns [`Error::Cancelled`] if shutdown fires first and
    /// [`Error::TimedOut`] if the deadline passes first; the inner future is
    /// dropped in both cases.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.shutdown.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let mut shutdown = self.shutdown.clone();
        let bounded = tokio::time::timeout_at(self.deadline, fut.instrument(self.span.clone()));

        tokio::select! {
            biased;
            _ = shutdown.cancelled() => Err(Error::Cancelled),
            outcome = bounded => match outcome {
                Ok(result) => result,
                Err(_) => Err(Error::TimedOut(self.timeout)),
            },
        }
    }
}
