//! Database row types and their conversion to domain types.

use crate::error::{StorageError, StorageResult};
use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};
use gatewarden_core::{AccessCode, AccessTags, AccessVia, Carrier, Contact, GateAccessEvent, ValidDays};

/// Row of the `account_code` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccessCodeRow {
    pub id: i64,
    pub account_id: i64,
    pub code: String,
    pub label: String,
    pub is_active: bool,
    pub is_utility: bool,
    pub is_delivery: bool,
    pub is_contractor: bool,
    pub is_mail: bool,
    pub date_start: Option<NaiveDateTime>,
    pub date_end: Option<NaiveDateTime>,
    pub time_start: Option<NaiveTime>,
    pub time_end: Option<NaiveTime>,
    pub valid_days: String,
}

impl TryFrom<AccessCodeRow> for AccessCode {
    type Error = StorageError;

    fn try_from(row: AccessCodeRow) -> StorageResult<Self> {
        let mut code = AccessCode::new(row.account_id, row.code, row.label)?;
        code.id = row.id;
        code.active = row.is_active;
        code.tags = AccessTags {
            utility: row.is_utility,
            delivery: row.is_delivery,
            contractor: row.is_contractor,
            mail: row.is_mail,
        };
        code.date_start = row.date_start;
        code.date_end = row.date_end;
        code.time_start = row.time_start;
        code.time_end = row.time_end;
        code.valid_days = ValidDays::from_csv(&row.valid_days)?;
        Ok(code)
    }
}

/// Row of the `contact` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContactRow {
    pub id: i64,
    pub account_id: i64,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub carrier: Option<String>,
    pub is_primary: bool,
    pub is_active: bool,
    pub is_utility: bool,
    pub is_delivery: bool,
    pub is_contractor: bool,
    pub is_mail: bool,
}

impl TryFrom<ContactRow> for Contact {
    type Error = StorageError;

    fn try_from(row: ContactRow) -> StorageResult<Self> {
        let carrier = row
            .carrier
            .as_deref()
            .filter(|c| !c.is_empty())
            .map(str::parse::<Carrier>)
            .transpose()?;
        Ok(Contact {
            id: row.id,
            account_id: row.account_id,
            email: row.email,
            phone: row.phone,
            carrier,
            primary: row.is_primary,
            active: row.is_active,
            interests: AccessTags {
                utility: row.is_utility,
                delivery: row.is_delivery,
                contractor: row.is_contractor,
                mail: row.is_mail,
            },
        })
    }
}

/// Row of the `gate_log` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GateLogRow {
    pub id: i64,
    pub succeeded: bool,
    pub via: String,
    pub actor: String,
    pub account_id: Option<i64>,
    pub code_used: Option<String>,
    pub code_tags: String,
    pub image: Option<Vec<u8>>,
    pub opened_at: DateTime<Utc>,
}

pub(crate) fn parse_via(via: &str) -> StorageResult<AccessVia> {
    match via {
        "pin" => Ok(AccessVia::Pin),
        "web" => Ok(AccessVia::Web),
        "unknown" => Ok(AccessVia::Unknown),
        other => Err(StorageError::Validation(format!("unknown access via: {other}"))),
    }
}

impl TryFrom<GateLogRow> for GateAccessEvent {
    type Error = StorageError;

    fn try_from(row: GateLogRow) -> StorageResult<Self> {
        Ok(GateAccessEvent {
            succeeded: row.succeeded,
            via: parse_via(&row.via)?,
            actor: row.actor,
            timestamp: row.opened_at,
            image: row.image,
            account_id: row.account_id,
            code_used: row.code_used,
            code_tags: row.code_tags,
        })
    }
}

/// Rows removed by a prune pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub codes: u64,
    pub contacts: u64,
    pub gate_logs: u64,
}

impl PruneReport {
    pub fn total(&self) -> u64 {
        self.codes + self.contacts + self.gate_logs
    }
}
