//! SQLite adapter for code lookup and the gate log.
//!
//! Besides the [`CodeLookup`] and [`EventSink`] implementations used on the
//! access path, [`SqliteStore`] carries the maintenance operations the
//! daemon and provisioning tools need: inserting and retiring codes and
//! contacts, reading back the gate log, and pruning old rows.

use crate::error::StorageResult;
use crate::models::{AccessCodeRow, ContactRow, GateLogRow, PruneReport};
use crate::traits::{CodeLookup, EventSink};
use chrono::{DateTime, Utc};
use gatewarden_core::access_code::is_valid_pin_format;
use gatewarden_core::{AccessCode, AccessTags, Contact, GateAccessEvent};
use sqlx::SqlitePool;
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};

const CODE_COLUMNS: &str = "id, account_id, code, label, is_active, is_utility, is_delivery, \
     is_contractor, is_mail, date_start, date_end, time_start, time_end, valid_days";

const CONTACT_COLUMNS: &str = "id, account_id, email, phone, carrier, is_primary, is_active, \
     is_utility, is_delivery, is_contractor, is_mail";

/// Store backed by the gate database.
///
/// Cheap to clone; clones share the connection pool.
///
/// # Examples
///
/// ```no_run
/// use gatewarden_core::AccessCode;
/// use gatewarden_storage::{CodeLookup, Database, SqliteStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let db = Database::open("gatewarden.db").await?;
/// let store = SqliteStore::new(db.pool().clone());
///
/// store.insert_code(&AccessCode::new(4, "4821", "Plumber")?).await?;
/// assert!(store.find_active_code("4821").await?.is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a code and return its row id.
    ///
    /// # Errors
    ///
    /// Fails with [`StorageError::Database`](crate::StorageError::Database)
    /// when another active code already uses the same PIN.
    pub async fn insert_code(&self, code: &AccessCode) -> StorageResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO account_code (
                account_id, code, label, is_active,
                is_utility, is_delivery, is_contractor, is_mail,
                date_start, date_end, time_start, time_end, valid_days
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(code.account_id)
        .bind(code.code())
        .bind(&code.label)
        .bind(code.active)
        .bind(code.tags.utility)
        .bind(code.tags.delivery)
        .bind(code.tags.contractor)
        .bind(code.tags.mail)
        .bind(code.date_start)
        .bind(code.date_end)
        .bind(code.time_start)
        .bind(code.time_end)
        .bind(code.valid_days.to_csv())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(id, code = %code.masked(), "access code inserted");
        Ok(id)
    }

    /// Retire a code. Returns false if no such row exists.
    ///
    /// The row stays in place, so the code stops matching at once but is
    /// only deleted by [`SqliteStore::prune`] after the retention period.
    pub async fn deactivate_code(&self, id: i64) -> StorageResult<bool> {
        let result = sqlx::query("UPDATE account_code SET is_active = 0, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Load a code by row id, active or not.
    pub async fn find_code_by_id(&self, id: i64) -> StorageResult<Option<AccessCode>> {
        let row: Option<AccessCodeRow> =
            sqlx::query_as(&format!("SELECT {CODE_COLUMNS} FROM account_code WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(AccessCode::try_from).transpose()
    }

    /// Insert a contact and return its row id.
    pub async fn insert_contact(&self, contact: &Contact) -> StorageResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO contact (
                account_id, email, phone, carrier, is_primary, is_active,
                is_utility, is_delivery, is_contractor, is_mail
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(contact.account_id)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(contact.carrier.map(|c| c.as_str()))
        .bind(contact.primary)
        .bind(contact.active)
        .bind(contact.interests.utility)
        .bind(contact.interests.delivery)
        .bind(contact.interests.contractor)
        .bind(contact.interests.mail)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Retire a contact. Returns false if no such row exists.
    pub async fn deactivate_contact(&self, id: i64) -> StorageResult<bool> {
        let result = sqlx::query("UPDATE contact SET is_active = 0, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Most recent gate log entries, newest first.
    pub async fn recent_events(&self, limit: i64) -> StorageResult<Vec<GateAccessEvent>> {
        let rows: Vec<GateLogRow> = sqlx::query_as(
            r#"
            SELECT id, succeeded, via, actor, account_id, code_used, code_tags, image, opened_at
            FROM gate_log
            ORDER BY opened_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(GateAccessEvent::try_from).collect()
    }

    /// Number of gate log rows with the given outcome.
    pub async fn count_events(&self, succeeded: bool) -> StorageResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM gate_log WHERE succeeded = ?")
            .bind(succeeded)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Delete retired codes and contacts last touched before `cutoff`, and
    /// gate log rows older than it.
    ///
    /// All three deletes run in one transaction. Active codes and contacts
    /// are never removed, however old.
    ///
    /// # Returns
    ///
    /// How many rows were removed from each table.
    pub async fn prune(&self, cutoff: DateTime<Utc>) -> StorageResult<PruneReport> {
        let mut tx = self.pool.begin().await?;

        let codes = sqlx::query("DELETE FROM account_code WHERE is_active = 0 AND updated_at < ?")
            .bind(cutoff)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let contacts = sqlx::query("DELETE FROM contact WHERE is_active = 0 AND updated_at < ?")
            .bind(cutoff)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let gate_logs = sqlx::query("DELETE FROM gate_log WHERE opened_at < ?")
            .bind(cutoff)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        let report = PruneReport {
            codes,
            contacts,
            gate_logs,
        };
        info!(
            codes = report.codes,
            contacts = report.contacts,
            gate_logs = report.gate_logs,
            cutoff = %cutoff,
            "pruned old records"
        );
        Ok(report)
    }
}

fn into_contacts(rows: Vec<ContactRow>) -> StorageResult<Vec<Contact>> {
    rows.into_iter().map(Contact::try_from).collect()
}

impl CodeLookup for SqliteStore {
    async fn find_active_code(&self, pin: &str) -> StorageResult<Option<AccessCode>> {
        if !is_valid_pin_format(pin) {
            return Ok(None);
        }

        // Compare every candidate of the same length so timing does not
        // depend on which row matched.
        let rows: Vec<AccessCodeRow> = sqlx::query_as(&format!(
            "SELECT {CODE_COLUMNS} FROM account_code WHERE is_active = 1 AND length(code) = ?"
        ))
        .bind(pin.len() as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut found = None;
        let mut matches = 0usize;
        for row in rows {
            let hit: bool = row.code.as_bytes().ct_eq(pin.as_bytes()).into();
            if hit {
                matches += 1;
                found = Some(row);
            }
        }

        match matches {
            0 => Ok(None),
            1 => found.map(AccessCode::try_from).transpose(),
            n => {
                warn!(matches = n, "pin matched more than one active code");
                Ok(None)
            }
        }
    }

    async fn find_account_contacts(&self, account_id: i64) -> StorageResult<Vec<Contact>> {
        let rows: Vec<ContactRow> = sqlx::query_as(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contact WHERE account_id = ? AND is_active = 1 ORDER BY id"
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        into_contacts(rows)
    }

    async fn find_group_contacts(&self, tags: AccessTags) -> StorageResult<Vec<Contact>> {
        if tags.is_personal() {
            return Ok(Vec::new());
        }
        let rows: Vec<ContactRow> = sqlx::query_as(&format!(
            r#"
            SELECT {CONTACT_COLUMNS} FROM contact
            WHERE is_active = 1 AND (
                (is_utility = 1 AND ? = 1) OR
                (is_delivery = 1 AND ? = 1) OR
                (is_contractor = 1 AND ? = 1) OR
                (is_mail = 1 AND ? = 1)
            )
            ORDER BY id
            "#
        ))
        .bind(tags.utility)
        .bind(tags.delivery)
        .bind(tags.contractor)
        .bind(tags.mail)
        .fetch_all(&self.pool)
        .await?;
        into_contacts(rows)
    }
}

impl EventSink for SqliteStore {
    async fn record(&self, event: &GateAccessEvent) -> StorageResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO gate_log (
                succeeded, via, actor, account_id, code_used, code_tags, image, opened_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.succeeded)
        .bind(event.via.as_str())
        .bind(&event.actor)
        .bind(event.account_id)
        .bind(&event.code_used)
        .bind(&event.code_tags)
        .bind(&event.image)
        .bind(event.timestamp)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(id, succeeded = event.succeeded, via = %event.via, "gate event recorded");
        Ok(id)
    }
}
