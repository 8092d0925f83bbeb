//! Periodic line sampling and change detection.
//!
//! The poller owns the previous snapshot. Each cycle it samples every
//! watched line, diffs against that snapshot and hands non-empty change-sets
//! to a single consumer over a bounded channel. A slow consumer never stalls
//! sampling: undelivered change-sets wait in a bounded backlog, oldest first.
//!
//! Change-sets are diffs, so none may be discarded. Once the backlog is full
//! each new change-set is merged into the newest queued one. Intermediate
//! edges inside that entry are lost, but the consumer still ends up with the
//! latest state of every line.

use crate::error::{HardwareError, Result};
use crate::traits::PinStateSource;
use gatewarden_core::{ChangeSet, LineNumber, PinState};
use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Change-sets held back while the consumer is behind. Beyond this the
/// newest entry absorbs further changes.
pub const BACKLOG_LIMIT: usize = 64;

/// Samples a [`PinStateSource`] on a fixed period.
///
/// # Examples
///
/// ```
/// use gatewarden_core::{ActiveLevel, PinState};
/// use gatewarden_hardware::{GpioLineSource, PinStatePoller};
/// use gatewarden_hardware::mock::MockGpio;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let (gpio, handle) = MockGpio::new();
/// let source = GpioLineSource::new(Arc::new(gpio), [5, 17], ActiveLevel::High).unwrap();
/// let mut poller = PinStatePoller::new(source, Duration::from_millis(100)).unwrap();
///
/// poller.poll_once(); // seeds the snapshot
/// handle.set_level(17, true);
/// assert_eq!(poller.poll_once().get(17), Some(PinState::Asserted));
/// ```
pub struct PinStatePoller<S> {
    source: S,
    previous: BTreeMap<LineNumber, PinState>,
    period: Duration,
}

impl<S: PinStateSource> PinStatePoller<S> {
    /// Build a poller. The period must be non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::InitializationFailed`] for a zero period.
    pub fn new(source: S, period: Duration) -> Result<Self> {
        if period.is_zero() {
            return Err(HardwareError::initialization_failed(
                "poll period must be greater than zero",
            ));
        }
        Ok(Self {
            source,
            previous: BTreeMap::new(),
            period,
        })
    }

    /// Time between samples.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Last known state of a line. `Unknown` until it has been read once.
    pub fn state(&self, line: LineNumber) -> PinState {
        self.previous.get(&line).copied().unwrap_or_default()
    }

    /// Take one sample and return the lines that changed.
    ///
    /// A line seen for the first time only seeds the snapshot. A line whose
    /// read failed keeps its previous state and reports no change.
    pub fn poll_once(&mut self) -> ChangeSet {
        let sample = self.source.sample();
        for failure in &sample.failures {
            warn!(error = %failure, "line sample failed, keeping previous state");
        }

        let mut changes = ChangeSet::new();
        for (line, state) in sample.states {
            match self.previous.insert(line, state) {
                Some(prev) if prev != state => changes.insert(line, state),
                Some(_) => {}
                None => trace!(line, %state, "seeded line state"),
            }
        }

        if !changes.is_empty() {
            debug!(%changes, "pin state changed");
        }
        changes
    }

    /// Poll until `shutdown` fires or the consumer goes away.
    ///
    /// Cancellation is only observed between cycles, so a sample is never
    /// cut short. Missed ticks are delayed rather than bunched up, and a
    /// full channel never blocks the next sample: see [`BACKLOG_LIMIT`].
    ///
    /// Change-sets still in the backlog at shutdown are dropped along with
    /// the consumer.
    pub async fn run(mut self, tx: mpsc::Sender<ChangeSet>, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut backlog: VecDeque<ChangeSet> = VecDeque::new();

        info!(period_ms = self.period.as_millis() as u64, "pin poller started");
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let changes = self.poll_once();
            if !changes.is_empty() {
                enqueue(&mut backlog, changes);
            }

            if !flush(&tx, &mut backlog) {
                info!("change-set consumer closed, stopping poller");
                break;
            }
        }
        info!("pin poller stopped");
    }
}

/// Queue a change-set, merging it into the newest entry once the backlog is full.
fn enqueue(backlog: &mut VecDeque<ChangeSet>, changes: ChangeSet) {
    if backlog.len() >= BACKLOG_LIMIT
        && let Some(newest) = backlog.back_mut()
    {
        warn!(backlog = BACKLOG_LIMIT, "change queue backlog full, merging into newest entry");
        newest.merge(changes);
        return;
    }
    backlog.push_back(changes);
}

/// Deliver queued change-sets in order. Returns false once the receiver is gone.
fn flush(tx: &mpsc::Sender<ChangeSet>, backlog: &mut VecDeque<ChangeSet>) -> bool {
    while let Some(changes) = backlog.pop_front() {
        match tx.try_send(changes) {
            Ok(()) => {}
            Err(TrySendError::Full(changes)) => {
                debug!(pending = backlog.len() + 1, "change queue full, deferring");
                backlog.push_front(changes);
                return true;
            }
            Err(TrySendError::Closed(_)) => return false,
        }
    }
    true
}
