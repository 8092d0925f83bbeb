//! The keypad task: change-sets in, PIN attempts out.

use crate::orchestrator::AccessOrchestrator;
use crate::notify::Notifier;
use gatewarden_core::ChangeSet;
use gatewarden_keypad::KeypadSession;
use gatewarden_storage::{CodeLookup, EventSink};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Consume change-sets until the queue closes or `shutdown` fires.
///
/// The session is owned here, so decoding stays on one task and in queue
/// order. Each completed PIN is handled on its own task; those still
/// running at shutdown are awaited so their events get stored.
pub async fn run_keypad<L, E, N>(
    mut session: KeypadSession,
    mut rx: mpsc::Receiver<ChangeSet>,
    orchestrator: Arc<AccessOrchestrator<L, E, N>>,
    shutdown: CancellationToken,
) where
    L: CodeLookup + 'static,
    E: EventSink + 'static,
    N: Notifier,
{
    let mut attempts = JoinSet::new();
    info!("keypad task started");

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                debug!("keypad task cancelled");
                break;
            }
            Some(result) = attempts.join_next(), if !attempts.is_empty() => {
                if let Err(e) = result {
                    warn!(error = %e, "PIN attempt task failed");
                }
            }
            changes = rx.recv() => {
                let Some(changes) = changes else {
                    debug!("change-set queue closed");
                    break;
                };
                debug!(%changes, "change-set received");
                if let Some(pin) = session.handle(&changes) {
                    let orchestrator = Arc::clone(&orchestrator);
                    attempts.spawn(async move {
                        if let Err(e) = orchestrator.handle_pin(pin.as_str()).await {
                            info!(error = %e, "PIN attempt refused");
                        }
                    });
                }
            }
        }
    }

    while let Some(result) = attempts.join_next().await {
        if let Err(e) = result {
            warn!(error = %e, "PIN attempt task failed");
        }
    }
    info!("keypad task stopped");
}
