use crate::access_code::{AccessCode, AccessTags, mask_pin};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How an access attempt reached the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessVia {
    Pin,
    Web,
    /// Attempt that never resolved to a principal.
    Unknown,
}

impl AccessVia {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AccessVia::Pin => "pin",
            AccessVia::Web => "web",
            AccessVia::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AccessVia {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user already authenticated by the web front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebActor {
    pub account_id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl WebActor {
    #[must_use]
    pub fn new(account_id: i64, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            account_id,
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// `Last, First`, as stored in the gate log.
    #[must_use]
    pub fn log_label(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }

    /// `First Last`, as used in notifications.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Record of one access attempt, granted or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateAccessEvent {
    pub succeeded: bool,
    pub via: AccessVia,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image: Option<Vec<u8>>,
    pub account_id: Option<i64>,
    /// The code that was matched. Only set for PIN entries.
    pub code_used: Option<String>,
    pub code_tags: String,
}

impl GateAccessEvent {
    pub const UNKNOWN_ACTOR: &'static str = "unknown";

    /// Event for a PIN that did not resolve to a usable code.
    #[must_use]
    pub fn denied(timestamp: DateTime<Utc>) -> Self {
        Self {
            succeeded: false,
            via: AccessVia::Unknown,
            actor: Self::UNKNOWN_ACTOR.to_string(),
            timestamp,
            image: None,
            account_id: None,
            code_used: None,
            code_tags: String::new(),
        }
    }

    #[must_use]
    pub fn for_code(code: &AccessCode, timestamp: DateTime<Utc>) -> Self {
        Self {
            succeeded: true,
            via: AccessVia::Pin,
            actor: code.label.clone(),
            timestamp,
            image: None,
            account_id: Some(code.account_id),
            code_used: Some(code.code().to_string()),
            code_tags: code.tags.to_string(),
        }
    }

    #[must_use]
    pub fn for_web(actor: &WebActor, timestamp: DateTime<Utc>) -> Self {
        Self {
            succeeded: true,
            via: AccessVia::Web,
            actor: actor.log_label(),
            timestamp,
            image: None,
            account_id: Some(actor.account_id),
            code_used: None,
            code_tags: AccessTags::default().to_string(),
        }
    }

    #[must_use]
    pub fn with_image(mut self, image: Option<Vec<u8>>) -> Self {
        self.image = image.filter(|bytes| !bytes.is_empty());
        self
    }

    /// `Website` for web entries, otherwise `PIN:` plus the masked code.
    #[must_use]
    pub fn opened_how(&self) -> String {
        match (self.via, &self.code_used) {
            (AccessVia::Web, _) => "Website".to_string(),
            (_, Some(code)) => format!("PIN:{}", mask_pin(code)),
            (_, None) => "PIN".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denied_event_reveals_nothing() {
        let event = GateAccessEvent::denied(Utc::now());
        assert!(!event.succeeded);
        assert_eq!(event.via, AccessVia::Unknown);
        assert_eq!(event.actor, "unknown");
        assert!(event.account_id.is_none());
        assert!(event.code_used.is_none());
    }

    #[test]
    fn test_code_event() {
        let code = AccessCode::new(9, "4821", "Plumber")
            .unwrap()
            .with_tags(AccessTags::utility());
        let event = GateAccessEvent::for_code(&code, Utc::now());
        assert_eq!(event.via, AccessVia::Pin);
        assert_eq!(event.actor, "Plumber");
        assert_eq!(event.account_id, Some(9));
        assert_eq!(event.code_tags, "Utility");
        assert_eq!(event.opened_how(), "PIN:****");
    }

    #[test]
    fn test_web_event_labels() {
        let actor = WebActor::new(3, "Ada", "Lovelace");
        let event = GateAccessEvent::for_web(&actor, Utc::now());
        assert_eq!(event.actor, "Lovelace, Ada");
        assert_eq!(actor.display_name(), "Ada Lovelace");
        assert_eq!(event.opened_how(), "Website");
        assert_eq!(event.code_tags, "");
    }

    #[test]
    fn test_empty_image_dropped() {
        let event = GateAccessEvent::denied(Utc::now()).with_image(Some(Vec::new()));
        assert!(event.image.is_none());
    }
}
