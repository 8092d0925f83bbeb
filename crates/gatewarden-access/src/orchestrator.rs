//! Turns a PIN or a web actor into a gate decision.
//!
//! Every attempt persists exactly one [`GateAccessEvent`] and carries a
//! still from the gate camera when one could be taken. Denials never touch
//! the gate and never look up recipients. Grants pulse the gate while the
//! still is captured, then hand notifications to a spawned task so the
//! caller is not held up by delivery.
//!
//! ```text
//! PIN ──lookup──> Validating ──window──> Granted ──> pulse + still ──> persist ──> notify
//!   │                 │
//!   └── no code ──────┴── outside window ──> Denied ──> still ──> persist
//! ```

use crate::error::{AccessError, Result};
use crate::notify::{Notifier, pin_entry_body, subject_for, web_entry_body};
use crate::state::{Attempt, AttemptState};
use chrono::{DateTime, Local, Utc};
use gatewarden_core::constants::DEFAULT_MESSAGE_SECS;
use gatewarden_core::{
    AccessCode, AccessWindowEvaluator, DisplayMessages, GateAccessEvent, WebActor,
};
use gatewarden_gate::GateActuator;
use gatewarden_hardware::{CameraBackend, DisplayBackend};
use gatewarden_storage::{CodeLookup, EventSink};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Static settings for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Prefix for notification subjects.
    pub site_name: String,
    /// How long display messages stay up.
    pub message_ttl: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            site_name: "Gatewarden".to_string(),
            message_ttl: Duration::from_secs(DEFAULT_MESSAGE_SECS),
        }
    }
}

/// Decides on access attempts and carries out the outcome.
///
/// One per process, shared behind an `Arc` by the keypad task and any web
/// front end. Attempts may run concurrently; the [`GateActuator`] folds
/// overlapping grants into a single pulse.
///
/// # Type parameters
///
/// - `L`: where PINs and notification contacts are looked up
/// - `E`: where access events are recorded
/// - `N`: how notifications are delivered
pub struct AccessOrchestrator<L, E, N> {
    lookup: Arc<L>,
    sink: Arc<E>,
    notifier: Arc<N>,
    gate: Arc<GateActuator>,
    camera: Arc<dyn CameraBackend>,
    display: Option<Arc<dyn DisplayBackend>>,
    settings: OrchestratorSettings,
}

impl<L, E, N> std::fmt::Debug for AccessOrchestrator<L, E, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessOrchestrator")
            .field("gate", &self.gate)
            .field("camera", &self.camera)
            .field("display", &self.display)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<L, E, N> AccessOrchestrator<L, E, N>
where
    L: CodeLookup,
    E: EventSink,
    N: Notifier,
{
    /// Build an orchestrator without a display.
    ///
    /// # Arguments
    ///
    /// * `lookup` - Source of access codes and contacts
    /// * `sink` - Destination for access events
    /// * `notifier` - Delivers entry notifications
    /// * `gate` - The gate output
    /// * `camera` - Takes the still attached to each event
    /// * `settings` - Site name and message timing
    pub fn new(
        lookup: Arc<L>,
        sink: Arc<E>,
        notifier: Arc<N>,
        gate: Arc<GateActuator>,
        camera: Arc<dyn CameraBackend>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            lookup,
            sink,
            notifier,
            gate,
            camera,
            display: None,
            settings,
        }
    }

    /// Show outcome messages (welcome, invalid PIN, gate fault) on `display`.
    #[must_use]
    pub fn with_display(mut self, display: Arc<dyn DisplayBackend>) -> Self {
        self.display = Some(display);
        self
    }

    /// The gate this orchestrator drives.
    pub fn gate(&self) -> &Arc<GateActuator> {
        &self.gate
    }

    /// Handle a PIN submitted from the keypad.
    ///
    /// # Returns
    ///
    /// The stored event when the gate opened.
    ///
    /// # Errors
    ///
    /// - [`AccessError::UnknownOrExpiredCode`] when no active code matches
    ///   or the code is outside its window. The two are not distinguished.
    /// - [`AccessError::Storage`] when the code lookup failed. The attempt
    ///   is recorded as a denial.
    /// - [`AccessError::Actuation`] when the gate output failed. The event
    ///   is recorded with `succeeded = false`.
    pub async fn handle_pin(&self, pin: &str) -> Result<GateAccessEvent> {
        self.handle_pin_at(pin, Local::now()).await
    }

    /// Handle a PIN as if entered at `now`. Windows are checked against the
    /// local wall clock.
    pub async fn handle_pin_at(&self, pin: &str, now: DateTime<Local>) -> Result<GateAccessEvent> {
        let mut attempt = Attempt::new();
        let timestamp = now.with_timezone(&Utc);

        let code = match self.lookup.find_active_code(pin).await {
            Ok(code) => code,
            Err(e) => {
                error!(error = %e, "code lookup failed");
                self.deny(&mut attempt, timestamp).await;
                return Err(AccessError::Storage(e));
            }
        };

        let Some(code) = code else {
            info!(pin_len = pin.len(), "no active code for PIN");
            self.deny(&mut attempt, timestamp).await;
            return Err(AccessError::UnknownOrExpiredCode);
        };

        self.advance(&mut attempt, AttemptState::Validating);
        let check = AccessWindowEvaluator::evaluate(&code, now.naive_local());
        if !check.is_valid() {
            info!(code = %code.masked(), label = %code.label, reason = %check, "code outside its window");
            self.deny(&mut attempt, timestamp).await;
            return Err(AccessError::UnknownOrExpiredCode);
        }

        self.advance(&mut attempt, AttemptState::Granted);
        info!(code = %code.masked(), label = %code.label, "access granted by PIN");

        let event = GateAccessEvent::for_code(&code, timestamp);
        let event = self.open(event).await?;

        let recipients = self.recipients_for(&code).await;
        self.dispatch(recipients, pin_entry_body(&code.label, &now));
        Ok(event)
    }

    /// Handle an already authenticated web request.
    ///
    /// Always granted. The entry is recorded but nobody is notified.
    ///
    /// # Errors
    ///
    /// [`AccessError::Actuation`] when the gate output failed.
    pub async fn handle_web(&self, actor: &WebActor) -> Result<GateAccessEvent> {
        let mut attempt = Attempt::new();
        self.advance(&mut attempt, AttemptState::Granted);
        info!(actor = %actor.log_label(), account_id = actor.account_id, "access granted by web");

        let event = GateAccessEvent::for_web(actor, Utc::now());
        let event = self.open(event).await?;

        // Web entries are logged but not announced.
        debug!(body = %web_entry_body(actor), "web entry notification suppressed");
        Ok(event)
    }

    fn advance(&self, attempt: &mut Attempt, target: AttemptState) {
        if let Err(e) = attempt.transition_to(target) {
            warn!(error = %e, "unexpected attempt transition");
        }
    }

    async fn deny(&self, attempt: &mut Attempt, timestamp: DateTime<Utc>) {
        self.advance(attempt, AttemptState::Denied);
        let event = GateAccessEvent::denied(timestamp).with_image(self.capture().await);
        self.persist(&event).await;
        self.show(DisplayMessages::INVALID_PIN);
    }

    /// Pulse the gate and grab a still at the same time, then persist.
    async fn open(&self, event: GateAccessEvent) -> Result<GateAccessEvent> {
        let (pulse, image) = tokio::join!(self.gate.trigger(), self.capture());
        let mut event = event.with_image(image);

        if let Err(e) = pulse {
            error!(error = %e, "gate did not open");
            event.succeeded = false;
            self.persist(&event).await;
            self.show(DisplayMessages::GATE_FAULT);
            return Err(AccessError::Actuation(e));
        }

        self.persist(&event).await;
        self.show(DisplayMessages::WELCOME);
        Ok(event)
    }

    /// Best-effort still. The camera is blocking, so it runs off the runtime.
    async fn capture(&self) -> Option<Vec<u8>> {
        let camera = Arc::clone(&self.camera);
        match tokio::task::spawn_blocking(move || camera.capture_still()).await {
            Ok(Ok(bytes)) => Some(bytes),
            Ok(Err(e)) => {
                warn!(error = %e, "still capture failed");
                None
            }
            Err(e) => {
                warn!(error = %e, "still capture task failed");
                None
            }
        }
    }

    async fn persist(&self, event: &GateAccessEvent) {
        match self.sink.record(event).await {
            Ok(id) => debug!(id, succeeded = event.succeeded, "access event stored"),
            Err(e) => error!(error = %e, "failed to store access event"),
        }
    }

    async fn recipients_for(&self, code: &AccessCode) -> Vec<String> {
        let contacts = match self.lookup.find_notify_contacts(code).await {
            Ok(contacts) => contacts,
            Err(e) => {
                warn!(error = %e, "failed to load notification contacts");
                return Vec::new();
            }
        };
        let addresses: BTreeSet<String> = contacts
            .iter()
            .filter_map(|contact| {
                let address = contact.notify_address();
                if address.is_none() {
                    debug!(contact_id = contact.id, "contact has no usable address");
                }
                address
            })
            .collect();
        addresses.into_iter().collect()
    }

    fn dispatch(&self, recipients: Vec<String>, body: String) {
        if recipients.is_empty() {
            debug!("no one to notify");
            return;
        }
        let notifier = Arc::clone(&self.notifier);
        let subject = subject_for(&self.settings.site_name);
        tokio::spawn(async move {
            match notifier.notify(&recipients, &subject, &body).await {
                Ok(()) => debug!(count = recipients.len(), "notifications sent"),
                Err(e) => warn!(error = %e, "notification failed"),
            }
        });
    }

    fn show(&self, text: &str) {
        if let Some(display) = &self.display
            && let Err(e) = display.show(text, Some(self.settings.message_ttl))
        {
            warn!(error = %e, "display update failed");
        }
    }
}
