//! Outbound notifications for gate entries.
//!
//! Delivery (SMTP, SMS gateways) lives outside this workspace; the
//! orchestrator only hands a finished message to a [`Notifier`].

use chrono::{DateTime, TimeZone};
use gatewarden_core::WebActor;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Delivery to {recipient} failed: {message}")]
    Delivery { recipient: String, message: String },

    #[error("Notifier unavailable: {0}")]
    Unavailable(String),
}

/// Sends one message to a set of addresses.
///
/// Called off the access path; failures are logged by the caller and never
/// retried.
pub trait Notifier: Send + Sync + 'static {
    fn notify(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

pub fn subject_for(site_name: &str) -> String {
    format!("{site_name} Gate Notification")
}

/// `[May  7: 08:15] Plumber is entering the neighborhood`
pub fn pin_entry_body<Tz>(label: &str, at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("[{}] {label} is entering the neighborhood", at.format("%b %e: %H:%M"))
}

pub fn web_entry_body(actor: &WebActor) -> String {
    format!("{} has opened the gate.", actor.display_name())
}

/// Writes notifications to the log instead of sending them.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    async fn notify(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        for to in recipients {
            info!(to = %to, subject, body, "notification");
        }
        Ok(())
    }
}

/// A message handed to a [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Keeps every message in memory. Used by tests and demos.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentNotification>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make later sends fail after recording them.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }

    pub async fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().await.clone()
    }
}

impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        self.sent.lock().await.push(SentNotification {
            recipients: recipients.to_vec(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        if self.fail.load(Ordering::Relaxed) {
            return Err(NotifyError::Unavailable("recording notifier set to fail".into()));
        }
        Ok(())
    }
}
