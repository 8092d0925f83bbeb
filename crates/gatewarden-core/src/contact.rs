//! Notification contacts and SMS gateway addressing.

use crate::access_code::AccessTags;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mobile carrier with an email-to-SMS gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Carrier {
    Att,
    Tmobile,
    Verizon,
    Sprint,
    Uscell,
    Boost,
    Cricket,
    Googlefi,
    Metropcs,
    Virgin,
}

impl Carrier {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Carrier::Att => "att",
            Carrier::Tmobile => "tmobile",
            Carrier::Verizon => "verizon",
            Carrier::Sprint => "sprint",
            Carrier::Uscell => "uscell",
            Carrier::Boost => "boost",
            Carrier::Cricket => "cricket",
            Carrier::Googlefi => "googlefi",
            Carrier::Metropcs => "metropcs",
            Carrier::Virgin => "virgin",
        }
    }

    /// Domain of the carrier's email-to-SMS gateway.
    #[must_use]
    pub fn gateway_domain(self) -> &'static str {
        match self {
            Carrier::Att => "txt.att.net",
            Carrier::Tmobile => "tmomail.net",
            Carrier::Verizon => "vtext.com",
            Carrier::Sprint => "messaging.sprintpcs.com",
            Carrier::Uscell => "email.uscc.net",
            Carrier::Boost => "sms.myboostmobile.com",
            Carrier::Cricket => "sms.cricketwireless.net",
            Carrier::Googlefi => "msg.fi.google.com",
            Carrier::Metropcs => "mymetropcs.com",
            Carrier::Virgin => "vmobl.com",
        }
    }

    /// Gateway address for a phone number, sanitized to 10 digits first.
    pub fn sms_address(self, phone: &str) -> Result<String> {
        let digits = sanitize_phone(phone)?;
        Ok(format!("{digits}@{}", self.gateway_domain()))
    }
}

impl FromStr for Carrier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "att" => Ok(Carrier::Att),
            "tmobile" => Ok(Carrier::Tmobile),
            "verizon" => Ok(Carrier::Verizon),
            "sprint" => Ok(Carrier::Sprint),
            "uscell" => Ok(Carrier::Uscell),
            "boost" => Ok(Carrier::Boost),
            "cricket" => Ok(Carrier::Cricket),
            "googlefi" => Ok(Carrier::Googlefi),
            "metropcs" => Ok(Carrier::Metropcs),
            "virgin" => Ok(Carrier::Virgin),
            other => Err(Error::InvalidCarrier(other.to_string())),
        }
    }
}

impl fmt::Display for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reduce a phone number to its digits. Exactly 10 must remain.
pub fn sanitize_phone(phone: &str) -> Result<String> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != 10 {
        return Err(Error::InvalidPhone(format!(
            "must have 10 digits, got {}",
            digits.len()
        )));
    }
    Ok(digits)
}

/// `(555) 123-4567` for 10 digit numbers, unchanged otherwise.
#[must_use]
pub fn display_phone(phone: &str) -> String {
    if phone.len() != 10 || !phone.bytes().all(|b| b.is_ascii_digit()) {
        return phone.to_string();
    }
    format!("({}) {}-{}", &phone[..3], &phone[3..6], &phone[6..])
}

/// Someone who receives gate notifications.
///
/// `interests` lists the code categories this contact subscribes to; it is
/// only consulted for group fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub account_id: i64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub carrier: Option<Carrier>,
    #[serde(default)]
    pub primary: bool,
    pub active: bool,
    #[serde(default)]
    pub interests: AccessTags,
}

impl Contact {
    #[must_use]
    pub fn email(account_id: i64, email: impl Into<String>) -> Self {
        Self {
            id: 0,
            account_id,
            email: Some(email.into()),
            phone: None,
            carrier: None,
            primary: false,
            active: true,
            interests: AccessTags::default(),
        }
    }

    #[must_use]
    pub fn sms(account_id: i64, phone: impl Into<String>, carrier: Carrier) -> Self {
        Self {
            id: 0,
            account_id,
            email: None,
            phone: Some(phone.into()),
            carrier: Some(carrier),
            primary: false,
            active: true,
            interests: AccessTags::default(),
        }
    }

    #[must_use]
    pub fn with_interests(mut self, interests: AccessTags) -> Self {
        self.interests = interests;
        self
    }

    /// Where notifications go: the email if set, else the carrier SMS gateway.
    ///
    /// Returns `None` when neither resolves to a usable address.
    #[must_use]
    pub fn notify_address(&self) -> Option<String> {
        if let Some(email) = self.email.as_deref().filter(|e| !e.is_empty()) {
            return Some(email.to_string());
        }
        let phone = self.phone.as_deref()?;
        self.carrier?.sms_address(phone).ok()
    }

    /// Whether this contact is part of the fan-out for a tagged code.
    #[must_use]
    pub fn subscribed_to(&self, tags: AccessTags) -> bool {
        self.active && self.interests.intersects(tags)
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (&self.email, &self.phone, self.carrier) {
            (Some(email), _, _) if !email.is_empty() => write!(f, "{email}"),
            (_, Some(phone), Some(carrier)) => write!(
                f,
                "{} ({})",
                display_phone(phone),
                carrier.as_str().to_ascii_uppercase()
            ),
            (_, Some(phone), None) => write!(f, "{}", display_phone(phone)),
            _ => write!(f, "<no address>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("(555) 123-4567", "5551234567")]
    #[case("555.123.4567", "5551234567")]
    fn test_sanitize_phone(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(sanitize_phone(raw).unwrap(), expected);
    }

    #[rstest]
    #[case("123-4567")]
    #[case("1 555 123 4567")]
    fn test_sanitize_phone_wrong_length(#[case] raw: &str) {
        assert!(sanitize_phone(raw).is_err());
    }

    #[rstest]
    #[case(Carrier::Att, "5551234567@txt.att.net")]
    #[case(Carrier::Verizon, "5551234567@vtext.com")]
    #[case(Carrier::Googlefi, "5551234567@msg.fi.google.com")]
    fn test_sms_address(#[case] carrier: Carrier, #[case] expected: &str) {
        assert_eq!(carrier.sms_address("555-123-4567").unwrap(), expected);
    }

    #[test]
    fn test_carrier_parse() {
        assert_eq!("TMobile".parse::<Carrier>().unwrap(), Carrier::Tmobile);
        assert!("pager".parse::<Carrier>().is_err());
    }

    #[test]
    fn test_notify_address_prefers_email() {
        let mut contact = Contact::sms(1, "5551234567", Carrier::Att);
        assert_eq!(
            contact.notify_address().as_deref(),
            Some("5551234567@txt.att.net")
        );

        contact.email = Some("owner@example.com".into());
        assert_eq!(contact.notify_address().as_deref(), Some("owner@example.com"));
    }

    #[test]
    fn test_notify_address_invalid_phone() {
        let contact = Contact::sms(1, "12345", Carrier::Att);
        assert_eq!(contact.notify_address(), None);
    }

    #[test]
    fn test_subscribed_requires_active() {
        let mut contact = Contact::email(1, "ops@example.com").with_interests(AccessTags::utility());
        assert!(contact.subscribed_to(AccessTags::utility()));
        assert!(!contact.subscribed_to(AccessTags::delivery()));

        contact.active = false;
        assert!(!contact.subscribed_to(AccessTags::utility()));
    }

    #[test]
    fn test_display() {
        let contact = Contact::sms(1, "5551234567", Carrier::Cricket);
        assert_eq!(contact.to_string(), "(555) 123-4567 (CRICKET)");
    }
}
