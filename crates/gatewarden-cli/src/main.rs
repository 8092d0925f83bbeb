//! Gate controller daemon.
//!
//! Wires the keypad poller, the keypad task, the gate output and the
//! database together, then runs until Ctrl-C.
//!
//! Usage: `gatewarden [config.json]`

mod config;

use anyhow::{Context, Result};
use chrono::Utc;
use config::{Config, config_path};
use gatewarden_access::{AccessOrchestrator, OrchestratorSettings, TracingNotifier, run_keypad};
use gatewarden_gate::{GateActuator, GateSettings};
use gatewarden_hardware::{
    CameraBackend, ConsoleDisplay, DisplayBackend, GpioBackend, GpioLineSource, NullCamera,
    PinStatePoller,
};
use gatewarden_keypad::{
    KeypadLayout, KeypadMatrixDecoder, KeypadSession, PinEntryAccumulator, StrobedMatrixSource,
};
use gatewarden_storage::{AuditedSink, CsvAuditLog, Database, SqliteStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const PRUNE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = config_path(std::env::args().nth(1));
    let cfg = Config::load(&path)?;
    info!(
        version = gatewarden_core::VERSION,
        site = %cfg.site_name,
        config = %path.display(),
        "gatewarden starting"
    );

    let db = Database::open(&cfg.db_file)
        .await
        .with_context(|| format!("opening database {}", cfg.db_file))?;
    let lookup = Arc::new(SqliteStore::new(db.pool().clone()));
    let sink = Arc::new(AuditedSink::new(
        SqliteStore::new(db.pool().clone()),
        CsvAuditLog::new(&cfg.logs_dir),
    ));

    let gpio = open_gpio(&cfg.keypad.chip)?;
    let display: Arc<dyn DisplayBackend> = Arc::new(ConsoleDisplay);
    let camera: Arc<dyn CameraBackend> = Arc::new(NullCamera);

    let gate = GateActuator::new(Arc::clone(&gpio), GateSettings::from(&cfg.gate))
        .context("configuring gate output")?;
    let orchestrator = Arc::new(
        AccessOrchestrator::new(
            lookup,
            Arc::clone(&sink),
            Arc::new(TracingNotifier),
            Arc::new(gate),
            camera,
            OrchestratorSettings {
                site_name: cfg.site_name.clone(),
                message_ttl: cfg.display.message_ttl(),
            },
        )
        .with_display(Arc::clone(&display)),
    );

    let layout = KeypadLayout::new(cfg.keypad.rows, cfg.keypad.cols)
        .context("building keypad layout")?;
    let active = cfg.keypad.active_level();
    let period = cfg.keypad.poll_interval();
    let (tx, rx) = mpsc::channel(cfg.keypad.queue_depth);
    let shutdown = CancellationToken::new();
    let mut tasks = JoinSet::new();

    if cfg.keypad.strobe {
        let source = StrobedMatrixSource::new(Arc::clone(&gpio), layout.clone(), active)
            .context("configuring strobed keypad")?;
        let poller = PinStatePoller::new(source, period).context("configuring keypad poller")?;
        tasks.spawn(poller.run(tx, shutdown.clone()));
    } else {
        let source = GpioLineSource::new(Arc::clone(&gpio), layout.lines(), active)
            .context("configuring keypad lines")?;
        let poller = PinStatePoller::new(source, period).context("configuring keypad poller")?;
        tasks.spawn(poller.run(tx, shutdown.clone()));
    }

    let session = KeypadSession::new(
        KeypadMatrixDecoder::new(layout),
        PinEntryAccumulator::new(Some(display), cfg.display.message_ttl()),
    );
    tasks.spawn(run_keypad(session, rx, orchestrator, shutdown.clone()));
    tasks.spawn(prune_loop(
        SqliteStore::new(db.pool().clone()),
        cfg.retention_days,
        shutdown.clone(),
    ));

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("shutdown requested");
    shutdown.cancel();

    while let Some(result) = tasks.join_next().await {
        if let Err(e) = result {
            error!(error = %e, "task ended abnormally");
        }
    }
    sink.flush().await;
    db.close().await;
    info!("gatewarden stopped");
    Ok(())
}

#[cfg(feature = "hardware-gpiod")]
fn open_gpio(chip: &str) -> Result<Arc<dyn GpioBackend>> {
    let backend = gatewarden_hardware::GpiodBackend::open(chip)
        .with_context(|| format!("opening GPIO chip {chip}"))?;
    Ok(Arc::new(backend))
}

#[cfg(not(feature = "hardware-gpiod"))]
fn open_gpio(chip: &str) -> Result<Arc<dyn GpioBackend>> {
    warn!(chip, "built without hardware-gpiod, using mock GPIO lines");
    let (gpio, _handle) = gatewarden_hardware::mock::MockGpio::new();
    Ok(Arc::new(gpio))
}

/// Drop retired records and old gate logs once a day.
async fn prune_loop(store: SqliteStore, retention_days: u32, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(PRUNE_INTERVAL);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let cutoff = Utc::now() - chrono::Duration::days(i64::from(retention_days));
                if let Err(e) = store.prune(cutoff).await {
                    warn!(error = %e, "prune failed");
                }
            }
        }
    }
}
