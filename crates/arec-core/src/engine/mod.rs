//! Core arec engine
//!
//! The DdnsEngine is responsible for:
//! - Bootstrapping the record (zone lookup, record lookup, create if absent)
//! - Retrying bootstrap at a fixed delay until it succeeds or shutdown arrives
//! - Driving one reconciliation cycle per timer tick
//! - Stopping cleanly on the process-wide shutdown signal
//!
//! ## Architecture
//!
//! ```text
//!                   ┌──────────────┐
//!   Shutdown ──────▶│  DdnsEngine  │──── EngineEvent ───▶ (monitoring)
//!                   └──────────────┘
//!                          │ tick
//!                          ▼
//!                   ┌──────────────┐
//!                   │  Reconciler  │  (cached DnsRecord)
//!                   └──────────────┘
//!                     │          │
//!                     ▼          ▼
//!             ┌───────────┐  ┌─────────────┐
//!             │ IpSource  │  │ DnsProvider │
//!             └───────────┘  └─────────────┘
//! ```
//!
//! ## Lifecycle
//!
//! `Bootstrapping → Running → ShuttingDown → Stopped`. Shutdown during
//! bootstrap goes straight to `Stopped`.

mod reconciler;

pub use reconciler::Reconciler;

use crate::config::{DdnsConfig, EngineConfig, RecordConfig};
use crate::context::{CallContext, ShutdownListener};
use crate::error::{Error, Result};
use crate::record::ReconcileResult;
use crate::traits::{DnsProvider, IpSource};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{Instrument, debug, error, info, info_span, warn};

/// Lifecycle phase of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Bootstrapping,
    Running,
    ShuttingDown,
    Stopped,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Bootstrapping => "bootstrapping",
            Phase::Running => "running",
            Phase::ShuttingDown => "shutting_down",
            Phase::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The engine entered a new lifecycle phase
    PhaseChanged {
        phase: Phase,
    },

    /// A bootstrap attempt failed and will be retried
    BootstrapFailed {
        attempt: usize,
        error: String,
    },

    /// Bootstrap finished; `result` is `Created` or `Unchanged`
    BootstrapCompleted {
        result: ReconcileResult,
    },

    /// A steady-state cycle finished
    CycleCompleted {
        result: ReconcileResult,
    },

    /// A steady-state cycle ended early
    CycleFailed {
        error: String,
    },
}

/// Core arec engine
///
/// The engine owns the timer and the retry policy. It runs everything on the
/// task that calls [`DdnsEngine::run`], so at most one bootstrap attempt or
/// reconciliation cycle is in flight at any time.
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`]
/// 2. Start with [`DdnsEngine::run()`], passing the shutdown listener
/// 3. `run` returns once shutdown was requested
pub struct DdnsEngine {
    /// IP source for discovering the public address
    ip_source: Arc<dyn IpSource>,

    /// DNS provider holding the record
    provider: Arc<dyn DnsProvider>,

    /// The record to manage
    record: RecordConfig,

    /// Timer and retry settings
    settings: EngineConfig,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DdnsEngine {
    /// Create a new engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        config: DdnsConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            ip_source: Arc::from(ip_source),
            provider: Arc::from(provider),
            record: config.record,
            settings: config.engine,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run the engine until `shutdown` fires
    ///
    /// Bootstrap and cycle failures are logged, reported as events and
    /// retried; they never end the run.
    pub async fn run(self, mut shutdown: ShutdownListener) {
        info!(
            record = %self.record.name,
            zone = %self.record.zone_name,
            provider = self.provider.provider_name(),
            ip_source = self.ip_source.source_name(),
            "running setup"
        );
        self.enter(Phase::Bootstrapping);

        let Some(mut reconciler) = self.bootstrap_with_retry(&mut shutdown).await else {
            info!("shutdown requested during setup, exiting");
            self.enter(Phase::Stopped);
            return;
        };

        self.enter(Phase::Running);
        info!(interval = ?self.settings.interval(), "starting update loop");

        let interval = self.settings.interval();
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let ticked = tokio::select! {
                biased;
                _ = shutdown.cancelled() => false,
                _ = ticker.tick() => true,
            };
            if !ticked {
                info!("shutdown signal received");
                break;
            }

            self.run_cycle(&mut reconciler, &shutdown).await;
        }

        self.enter(Phase::ShuttingDown);
        debug!(content = %reconciler.last_record().content, "discarding cached record");
        self.enter(Phase::Stopped);
        info!("engine stopped");
    }

    /// Repeat bootstrap until it succeeds; `None` when shutdown interrupted it
    async fn bootstrap_with_retry(&self, shutdown: &mut ShutdownListener) -> Option<Reconciler> {
        let delay = self.settings.bootstrap_retry_delay();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let span = info_span!("setup", attempt);
            let ctx = CallContext::new(shutdown, self.settings.bootstrap_timeout(), span.clone());

            let outcome = Reconciler::bootstrap(
                Arc::clone(&self.ip_source),
                Arc::clone(&self.provider),
                &self.record,
                &ctx,
            )
            .instrument(span.clone())
            .await;

            match outcome {
                Ok((reconciler, result)) => {
                    span.in_scope(|| {
                        info!(
                            outcome = result.kind(),
                            content = %result.record().content,
                            "setup complete"
                        )
                    });
                    self.emit_event(EngineEvent::BootstrapCompleted { result });
                    return Some(reconciler);
                }
                Err(Error::Cancelled) => return None,
                Err(e) => {
                    span.in_scope(|| {
                        error!(error = %e, "setting up initial record");
                        info!(delay = ?delay, "retrying setup");
                    });
                    self.emit_event(EngineEvent::BootstrapFailed {
                        attempt,
                        error: e.to_string(),
                    });
                }
            }

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => return None,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Run one bounded reconciliation cycle and report its outcome
    async fn run_cycle(&self, reconciler: &mut Reconciler, shutdown: &ShutdownListener) {
        let span = info_span!("update", record = %self.record.name);
        let ctx = CallContext::new(shutdown, self.settings.cycle_timeout(), span.clone());

        async {
            info!("checking IP");
            match reconciler.reconcile(&ctx).await {
                Ok(result) => {
                    if let ReconcileResult::Updated(record) = &result {
                        info!(content = %record.content, "record updated");
                    }
                    debug!(outcome = result.kind(), time_left = ?ctx.remaining(), "cycle finished");
                    self.emit_event(EngineEvent::CycleCompleted { result });
                }
                Err(e) if e.is_context_error() => {
                    warn!(error = %e, "update cycle aborted");
                    self.emit_event(EngineEvent::CycleFailed {
                        error: e.to_string(),
                    });
                }
                Err(e) => {
                    error!(error = %e, "update cycle failed");
                    self.emit_event(EngineEvent::CycleFailed {
                        error: e.to_string(),
                    });
                }
            }
        }
        .instrument(span)
        .await
    }

    fn enter(&self, phase: Phase) {
        debug!(%phase, "engine phase");
        self.emit_event(EngineEvent::PhaseChanged { phase });
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        // Never block the engine on a slow consumer; nobody listening is fine.
        if let Err(mpsc::error::TrySendError::Full(_)) = self.event_tx.try_send(event) {
            warn!(
                "Event channel full, dropping event. Consider increasing event_channel_capacity."
            );
        }
    }

    /// The record this engine manages
    pub fn record(&self) -> &RecordConfig {
        &self.record
    }
}
