//! Keypad access codes.
//!
//! An [`AccessCode`] is a PIN owned by an account, optionally restricted to a
//! date range, a time-of-day window and a set of weekdays. Window evaluation
//! lives in [`crate::validity`].

use crate::constants::{MIN_PIN_LENGTH, PIN_MASK_CHAR};
use crate::error::{Error, Result};
use chrono::{NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Returns true when `pin` is all ASCII digits and at least [`MIN_PIN_LENGTH`] long.
#[must_use]
pub fn is_valid_pin_format(pin: &str) -> bool {
    pin.len() >= MIN_PIN_LENGTH && pin.bytes().all(|b| b.is_ascii_digit())
}

/// Mask a PIN for display or logging, one mask character per digit.
#[must_use]
pub fn mask_pin(pin: &str) -> String {
    std::iter::repeat_n(PIN_MASK_CHAR, pin.chars().count()).collect()
}

const DAY_TOKENS: [(&str, Weekday); 7] = [
    ("su", Weekday::Sun),
    ("mo", Weekday::Mon),
    ("tu", Weekday::Tue),
    ("we", Weekday::Wed),
    ("th", Weekday::Thu),
    ("fr", Weekday::Fri),
    ("sa", Weekday::Sat),
];

/// Set of weekdays a code is valid on.
///
/// Serialized as a list of two-letter lowercase tokens (`su`, `mo`, ...).
/// An empty set and a full set both mean "every day".
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ValidDays(u8);

impl ValidDays {
    const ALL: u8 = 0b0111_1111;

    #[must_use]
    pub fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    pub fn every_day() -> Self {
        Self(Self::ALL)
    }

    fn bit(day: Weekday) -> u8 {
        1 << day.num_days_from_sunday()
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= Self::bit(day);
    }

    #[must_use]
    pub fn with(mut self, day: Weekday) -> Self {
        self.insert(day);
        self
    }

    #[must_use]
    pub fn contains(self, day: Weekday) -> bool {
        self.0 & Self::bit(day) != 0
    }

    #[must_use]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// No weekday restriction applies.
    #[must_use]
    pub fn is_unrestricted(self) -> bool {
        self.0 == 0 || self.0 == Self::ALL
    }

    /// Whether a code with this set may be used on `day`.
    #[must_use]
    pub fn allows(self, day: Weekday) -> bool {
        self.is_unrestricted() || self.contains(day)
    }

    /// Parse a single two-letter day token, case-insensitive.
    pub fn parse_token(token: &str) -> Result<Weekday> {
        let token = token.trim().to_ascii_lowercase();
        DAY_TOKENS
            .iter()
            .find(|(t, _)| *t == token)
            .map(|(_, day)| *day)
            .ok_or(Error::InvalidWeekday(token))
    }

    /// Parse the comma separated form used by the database column.
    pub fn from_csv(s: &str) -> Result<Self> {
        s.split(',')
            .filter(|t| !t.trim().is_empty())
            .try_fold(Self::empty(), |days, t| Ok(days.with(Self::parse_token(t)?)))
    }

    #[must_use]
    pub fn to_csv(self) -> String {
        self.tokens().join(",")
    }

    /// Tokens in Sunday-first order.
    #[must_use]
    pub fn tokens(self) -> Vec<&'static str> {
        DAY_TOKENS
            .iter()
            .filter(|(_, day)| self.contains(*day))
            .map(|(t, _)| *t)
            .collect()
    }
}

impl FromIterator<Weekday> for ValidDays {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), ValidDays::with)
    }
}

impl TryFrom<Vec<String>> for ValidDays {
    type Error = Error;

    fn try_from(tokens: Vec<String>) -> Result<Self> {
        tokens
            .iter()
            .try_fold(Self::empty(), |days, t| Ok(days.with(Self::parse_token(t)?)))
    }
}

impl From<ValidDays> for Vec<String> {
    fn from(days: ValidDays) -> Self {
        days.tokens().into_iter().map(String::from).collect()
    }
}

impl fmt::Debug for ValidDays {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.tokens()).finish()
    }
}

/// Interest-group tags on a code.
///
/// A code with none of these set is a personal code and notifies only its
/// own account's contacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AccessTags {
    #[serde(default)]
    pub utility: bool,
    #[serde(default)]
    pub delivery: bool,
    #[serde(default)]
    pub contractor: bool,
    #[serde(default)]
    pub mail: bool,
}

impl AccessTags {
    #[must_use]
    pub fn utility() -> Self {
        Self {
            utility: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn delivery() -> Self {
        Self {
            delivery: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_personal(self) -> bool {
        !(self.utility || self.delivery || self.contractor || self.mail)
    }

    /// True when any tag set here is also set in `other`.
    #[must_use]
    pub fn intersects(self, other: AccessTags) -> bool {
        (self.utility && other.utility)
            || (self.delivery && other.delivery)
            || (self.contractor && other.contractor)
            || (self.mail && other.mail)
    }

    #[must_use]
    pub fn labels(self) -> Vec<&'static str> {
        [
            (self.utility, "Utility"),
            (self.delivery, "Delivery"),
            (self.contractor, "Contractor"),
            (self.mail, "Mail"),
        ]
        .into_iter()
        .filter_map(|(set, label)| set.then_some(label))
        .collect()
    }
}

impl fmt::Display for AccessTags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.labels().join(", "))
    }
}

/// A keypad PIN owned by an account.
///
/// The code string is fixed at construction. Codes are retired by clearing
/// `active`, never by editing the code.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessCode {
    pub id: i64,
    pub account_id: i64,
    code: String,
    pub label: String,
    pub active: bool,
    #[serde(default)]
    pub tags: AccessTags,
    #[serde(default)]
    pub date_start: Option<NaiveDateTime>,
    #[serde(default)]
    pub date_end: Option<NaiveDateTime>,
    #[serde(default)]
    pub time_start: Option<NaiveTime>,
    #[serde(default)]
    pub time_end: Option<NaiveTime>,
    #[serde(default)]
    pub valid_days: ValidDays,
}

impl AccessCode {
    /// Create an active, unrestricted code.
    pub fn new(account_id: i64, code: impl Into<String>, label: impl Into<String>) -> Result<Self> {
        let code = code.into();
        if !is_valid_pin_format(&code) {
            return Err(Error::InvalidPinFormat(format!(
                "expected at least {MIN_PIN_LENGTH} digits, got {} characters",
                code.len()
            )));
        }
        Ok(Self {
            id: 0,
            account_id,
            code,
            label: label.into(),
            active: true,
            tags: AccessTags::default(),
            date_start: None,
            date_end: None,
            time_start: None,
            time_end: None,
            valid_days: ValidDays::empty(),
        })
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Constant-time comparison against an entered PIN.
    #[must_use]
    pub fn matches(&self, pin: &str) -> bool {
        self.code.as_bytes().ct_eq(pin.as_bytes()).into()
    }

    #[must_use]
    pub fn masked(&self) -> String {
        mask_pin(&self.code)
    }

    #[must_use]
    pub fn with_tags(mut self, tags: AccessTags) -> Self {
        self.tags = tags;
        self
    }

    #[must_use]
    pub fn with_dates(mut self, start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        self.date_start = start;
        self.date_end = end;
        self
    }

    #[must_use]
    pub fn with_hours(mut self, start: NaiveTime, end: NaiveTime) -> Self {
        self.time_start = Some(start);
        self.time_end = Some(end);
        self
    }

    #[must_use]
    pub fn with_days(mut self, days: ValidDays) -> Self {
        self.valid_days = days;
        self
    }

    #[must_use]
    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }
}

// Never print the raw code.
impl fmt::Debug for AccessCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("AccessCode")
            .field("id", &self.id)
            .field("account_id", &self.account_id)
            .field("code", &self.masked())
            .field("label", &self.label)
            .field("active", &self.active)
            .field("tags", &self.tags)
            .field("date_start", &self.date_start)
            .field("date_end", &self.date_end)
            .field("time_start", &self.time_start)
            .field("time_end", &self.time_end)
            .field("valid_days", &self.valid_days)
            .finish()
    }
}
