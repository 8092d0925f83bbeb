//! Access window evaluation.
//!
//! [`TemporalValidity`] is implemented by anything that carries an active
//! flag, a date range, a weekday set and a daily time window. The checks run
//! in a fixed order and the first failure decides the outcome:
//!
//! 1. active flag
//! 2. date start (`now >= start`)
//! 3. date end (`now <= end`)
//! 4. weekday set (empty or all seven means unrestricted)
//! 5. time-of-day window, only when both ends are set
//!
//! The time-of-day window is exclusive at both ends and wraps past midnight
//! when `start >= end`.
//!
//! ```
//! use chrono::{NaiveDate, NaiveTime};
//! use gatewarden_core::{AccessCode, AccessWindowEvaluator};
//!
//! let code = AccessCode::new(7, "4821", "Night shift")
//!     .unwrap()
//!     .with_hours(
//!         NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
//!         NaiveTime::from_hms_opt(2, 0, 0).unwrap(),
//!     );
//! let late = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(23, 30, 0).unwrap();
//! assert!(AccessWindowEvaluator::is_valid(&code, late));
//! ```

use crate::access_code::{AccessCode, ValidDays};
use chrono::{Datelike, NaiveDateTime, NaiveTime, Timelike};
use std::fmt;

/// Outcome of a window evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowCheck {
    Valid,
    Inactive,
    NotYetStarted,
    Ended,
    WrongWeekday,
    OutsideHours,
}

impl WindowCheck {
    #[must_use]
    pub fn is_valid(self) -> bool {
        self == WindowCheck::Valid
    }
}

impl fmt::Display for WindowCheck {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            WindowCheck::Valid => "valid",
            WindowCheck::Inactive => "inactive",
            WindowCheck::NotYetStarted => "not yet started",
            WindowCheck::Ended => "ended",
            WindowCheck::WrongWeekday => "wrong weekday",
            WindowCheck::OutsideHours => "outside hours",
        };
        write!(f, "{s}")
    }
}

/// Entities with an activation flag and a validity window.
///
/// Implementors provide the accessors; [`TemporalValidity::check_at`] is the
/// shared evaluation.
pub trait TemporalValidity {
    fn is_active(&self) -> bool;

    fn validity_start(&self) -> Option<NaiveDateTime>;

    fn validity_end(&self) -> Option<NaiveDateTime>;

    fn valid_days(&self) -> ValidDays;

    /// Daily window, `None` when either end is missing.
    fn daily_window(&self) -> Option<(NaiveTime, NaiveTime)>;

    fn check_at(&self, now: NaiveDateTime) -> WindowCheck {
        if !self.is_active() {
            return WindowCheck::Inactive;
        }

        if let Some(start) = self.validity_start()
            && now < start
        {
            return WindowCheck::NotYetStarted;
        }

        if let Some(end) = self.validity_end()
            && now > end
        {
            return WindowCheck::Ended;
        }

        if !self.valid_days().allows(now.weekday()) {
            return WindowCheck::WrongWeekday;
        }

        if let Some((start, end)) = self.daily_window()
            && !within_daily_window(start, end, now.time())
        {
            return WindowCheck::OutsideHours;
        }

        WindowCheck::Valid
    }

    fn is_valid_at(&self, now: NaiveDateTime) -> bool {
        self.check_at(now).is_valid()
    }
}

/// Strict time-of-day comparison, wrapping at midnight when `start >= end`.
///
/// Times are compared at minute-and-second resolution; sub-second parts are
/// dropped so a stored `02:00:00` excludes a clock reading of `02:00:00.4`.
#[must_use]
pub fn within_daily_window(start: NaiveTime, end: NaiveTime, now: NaiveTime) -> bool {
    let tod = now.with_nanosecond(0).unwrap_or(now);
    if start < end {
        start < tod && tod < end
    } else {
        tod > start || tod < end
    }
}

impl TemporalValidity for AccessCode {
    fn is_active(&self) -> bool {
        self.active
    }

    fn validity_start(&self) -> Option<NaiveDateTime> {
        self.date_start
    }

    fn validity_end(&self) -> Option<NaiveDateTime> {
        self.date_end
    }

    fn valid_days(&self) -> ValidDays {
        self.valid_days
    }

    fn daily_window(&self) -> Option<(NaiveTime, NaiveTime)> {
        self.time_start.zip(self.time_end)
    }
}

/// Stateless entry point for checking codes against the local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessWindowEvaluator;

impl AccessWindowEvaluator {
    /// Whether `code` may be used at `now`. Never mutates the code.
    #[must_use]
    pub fn is_valid(code: &AccessCode, now: NaiveDateTime) -> bool {
        code.is_valid_at(now)
    }

    /// Like [`AccessWindowEvaluator::is_valid`] but reports which check failed.
    #[must_use]
    pub fn evaluate(code: &AccessCode, now: NaiveDateTime) -> WindowCheck {
        code.check_at(now)
    }
}
