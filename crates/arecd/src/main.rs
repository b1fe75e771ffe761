// # arecd - A-record DDNS daemon
//
// This daemon is a THIN integration layer: it parses flags, installs logging,
// wires the HTTP IP source and the Cloudflare provider into the engine and
// forwards SIGINT/SIGTERM as the shutdown signal. All reconciliation, retry
// and timing logic lives in arec-core.
//
// ## Example
//
// ```bash
// export CLOUDFLARE_TOKEN=your_token
// arecd --zone-name example.com --record-name home.example.com --interval 2m
// ```
//
// ## Exit Codes
//
// - 0: Clean shutdown after a signal
// - 1: Invalid flags, or the API token was rejected
// - 2: Runtime failure (tokio runtime, signal handlers, engine task)

mod cli;

use anyhow::{Context, Result};
use arec_core::traits::DnsProvider;
use arec_core::{DdnsConfig, DdnsEngine, EngineEvent, Shutdown};
use arec_ip_http::HttpIpSource;
use arec_provider_cloudflare::CloudflareProvider;
use clap::Parser;
use cli::Args;
use std::future::Future;
use std::pin::Pin;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// How long the engine gets to wind down after a signal
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or credential error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or rejected credentials
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Pick the exit code for a daemon error
///
/// Configuration and authentication failures are the operator's to fix;
/// everything else is a runtime failure.
fn exit_code_for(err: &anyhow::Error) -> DdnsExitCode {
    match err.downcast_ref::<arec_core::Error>() {
        Some(arec_core::Error::Config(_) | arec_core::Error::Authentication(_)) => {
            DdnsExitCode::ConfigError
        }
        _ => DdnsExitCode::RuntimeError,
    }
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version land here too
            let _ = e.print();
            return if e.use_stderr() {
                DdnsExitCode::ConfigError.into()
            } else {
                DdnsExitCode::CleanShutdown.into()
            };
        }
    };

    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    let ip_url = args.ip_url.clone();

    let (config, token) = match args.into_config() {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Configuration validation error: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        zone = %config.record.zone_name,
        record = %config.record.name,
        "starting arecd"
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to create tokio runtime");
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(run_daemon(config, token, ip_url));

    match result {
        Ok(()) => DdnsExitCode::CleanShutdown.into(),
        Err(e) => {
            error!("daemon error: {:#}", e);
            exit_code_for(&e).into()
        }
    }
}

/// Run the daemon until a shutdown signal arrives
async fn run_daemon(config: DdnsConfig, token: String, ip_url: String) -> Result<()> {
    // Handlers go in before the first network call so a signal during startup is ours
    let signals = shutdown_signals()?;
    tokio::pin!(signals);

    let provider = CloudflareProvider::new(token)?;

    if let Some(received) =
        check_credentials_or_signal(&provider, &config.record.zone_name, signals.as_mut()).await?
    {
        info!(signal = received, "received shutdown signal during startup, exiting");
        return Ok(());
    }

    let ip_source = HttpIpSource::with_url(ip_url);
    let (engine, mut events) = DdnsEngine::new(Box::new(ip_source), Box::new(provider), config)?;

    let (shutdown, listener) = Shutdown::new();
    let mut engine_task = tokio::spawn(engine.run(listener));

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            log_event(&event);
        }
    });

    let signal_name = tokio::select! {
        received = &mut signals => received,
        joined = &mut engine_task => {
            return match joined {
                Ok(()) => Err(anyhow::anyhow!("engine stopped without a shutdown signal")),
                Err(e) => Err(anyhow::anyhow!("engine task failed: {}", e)),
            };
        }
    };

    info!(signal = signal_name, "received shutdown signal, shutting down");
    shutdown.trigger();

    match tokio::time::timeout(SHUTDOWN_GRACE, engine_task).await {
        Ok(Ok(())) => {
            info!("arecd stopped");
            Ok(())
        }
        Ok(Err(e)) => Err(anyhow::anyhow!("engine task failed: {}", e)),
        Err(_) => Err(anyhow::anyhow!("Shutdown timeout after {:?}", SHUTDOWN_GRACE)),
    }
}

/// Check the API token unless a shutdown signal arrives first
///
/// # Returns
///
/// - `Ok(None)`: Startup may continue
/// - `Ok(Some(signal))`: A signal interrupted the check
/// - `Err(_)`: Cloudflare rejected the token
async fn check_credentials_or_signal<S>(
    provider: &CloudflareProvider,
    zone_name: &str,
    signals: Pin<&mut S>,
) -> Result<Option<&'static str>>
where
    S: Future<Output = &'static str>,
{
    tokio::select! {
        biased;
        received = signals => Ok(Some(received)),
        checked = check_credentials(provider, zone_name) => checked.map(|()| None),
    }
}

/// Reject a bad token up front; anything short of a clear rejection is left to setup retries
///
/// `/user/tokens/verify` refuses account-owned tokens that can still manage
/// the zone, so a refusal there is confirmed with a zone lookup before it
/// counts as fatal.
async fn check_credentials(provider: &CloudflareProvider, zone_name: &str) -> Result<()> {
    match provider.verify_token().await {
        Ok(()) => {
            info!("API token verified");
            return Ok(());
        }
        Err(e @ arec_core::Error::Authentication(_)) => {
            warn!(error = %e, "token verification refused, checking zone access");
        }
        Err(e) => {
            warn!(error = %e, "could not verify API token, continuing");
            return Ok(());
        }
    }

    match provider.resolve_zone(zone_name).await {
        Ok(zone) => {
            info!(zone_id = %zone, "zone access confirmed");
            Ok(())
        }
        Err(e @ arec_core::Error::Authentication(_)) => {
            Err(e).context("Cloudflare rejected the API token")
        }
        Err(e) => {
            warn!(error = %e, "could not confirm zone access, continuing");
            Ok(())
        }
    }
}

fn log_event(event: &EngineEvent) {
    match event {
        EngineEvent::PhaseChanged { phase } => debug!(%phase, "engine phase changed"),
        EngineEvent::BootstrapFailed { attempt, .. } => debug!(attempt, "setup attempt failed"),
        EngineEvent::BootstrapCompleted { result } | EngineEvent::CycleCompleted { result } => {
            debug!(outcome = result.kind(), content = %result.record().content, "reconciled")
        }
        EngineEvent::CycleFailed { error } => debug!(%error, "update cycle failed"),
    }
}

/// Install the shutdown signal handlers (SIGTERM, SIGINT)
///
/// The handlers are registered before this returns; the future resolves with
/// the name of the first signal received.
#[cfg(unix)]
fn shutdown_signals() -> Result<impl Future<Output = &'static str>> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        }
    })
}

/// Install the shutdown signal handler (CTRL-C only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
fn shutdown_signals() -> Result<impl Future<Output = &'static str>> {
    let mut ctrl_c = tokio::signal::windows::ctrl_c()
        .map_err(|e| anyhow::anyhow!("Failed to setup CTRL-C handler: {}", e))?;

    Ok(async move {
        ctrl_c.recv().await;
        "SIGINT"
    })
}
