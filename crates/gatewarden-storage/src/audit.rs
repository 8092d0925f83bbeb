//! Day-sharded CSV audit trail kept next to the database.
//!
//! Layout under the logs directory:
//!
//! ```text
//! 2024/05-May/7.csv
//! 2024/05-May/pictures/2024-05-07_08_15AM.jpg
//! ```

use crate::error::StorageResult;
use crate::traits::EventSink;
use chrono::{DateTime, Local};
use gatewarden_core::GateAccessEvent;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

pub const CSV_HEADER: &str = "Timestamp,GateOpened,OpenedBy,OpenedHow,AccountID";

/// Appends one CSV line per gate event.
#[derive(Debug, Clone)]
pub struct CsvAuditLog {
    root: PathBuf,
}

impl CsvAuditLog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn month_dir(&self, at: &DateTime<Local>) -> PathBuf {
        self.root
            .join(at.format("%Y").to_string())
            .join(at.format("%m-%B").to_string())
    }

    /// File the event at `at` is appended to.
    pub fn day_file(&self, at: &DateTime<Local>) -> PathBuf {
        self.month_dir(at).join(format!("{}.csv", at.format("%-d")))
    }

    pub fn picture_file(&self, at: &DateTime<Local>) -> PathBuf {
        self.month_dir(at)
            .join("pictures")
            .join(format!("{}.jpg", at.format("%Y-%m-%d_%I_%M%p")))
    }

    /// Append `event` to its day file, writing the header for a new file,
    /// and save its still image if it has one. Returns the CSV path.
    pub fn append(&self, event: &GateAccessEvent) -> StorageResult<PathBuf> {
        let at = event.timestamp.with_timezone(&Local);
        let path = self.day_file(&at);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let new_file = !path.exists();
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        if new_file {
            writeln!(file, "{CSV_HEADER}")?;
        }
        writeln!(file, "{}", csv_line(event, &at))?;

        if let Some(image) = event.image.as_deref() {
            let picture = self.picture_file(&at);
            if let Some(dir) = picture.parent() {
                fs::create_dir_all(dir)?;
            }
            fs::write(&picture, image)?;
        }

        Ok(path)
    }
}

fn csv_line(event: &GateAccessEvent, at: &DateTime<Local>) -> String {
    [
        at.to_rfc3339_opts(chrono::SecondsFormat::Secs, false),
        event.succeeded.to_string(),
        event.actor.clone(),
        event.opened_how(),
        event.account_id.unwrap_or(0).to_string(),
    ]
    .iter()
    .map(|field| quote(field))
    .collect::<Vec<_>>()
    .join(",")
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Event sink that also writes the CSV audit trail.
///
/// The inner sink decides success; the CSV write runs on the blocking pool
/// afterwards and its failures are only logged. Writes still in flight are
/// tracked so [`AuditedSink::flush`] can wait for them before shutdown.
///
/// # Examples
///
/// ```no_run
/// use gatewarden_core::{GateAccessEvent, WebActor};
/// use gatewarden_storage::{AuditedSink, CsvAuditLog, EventSink, InMemoryStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let sink = AuditedSink::new(InMemoryStore::new(), CsvAuditLog::new("logs"));
/// let actor = WebActor::new(9, "Ada", "Lovelace");
/// sink.record(&GateAccessEvent::for_web(&actor, chrono::Utc::now())).await?;
/// sink.flush().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AuditedSink<E> {
    inner: E,
    audit: CsvAuditLog,
    writes: TaskTracker,
}

impl<E: EventSink> AuditedSink<E> {
    pub fn new(inner: E, audit: CsvAuditLog) -> Self {
        Self {
            inner,
            audit,
            writes: TaskTracker::new(),
        }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    /// Wait for every audit write started so far. Records made while this
    /// waits are tracked too and waited for.
    pub async fn flush(&self) {
        let pending = self.writes.len();
        self.writes.close();
        self.writes.wait().await;
        self.writes.reopen();
        if pending > 0 {
            info!(pending, "audit writes flushed");
        }
    }
}

impl<E: EventSink> EventSink for AuditedSink<E> {
    async fn record(&self, event: &GateAccessEvent) -> StorageResult<i64> {
        let id = self.inner.record(event).await?;

        let audit = self.audit.clone();
        let event = event.clone();
        self.writes.spawn_blocking(move || match audit.append(&event) {
            Ok(path) => debug!(path = %path.display(), "audit line written"),
            Err(e) => warn!(error = %e, "failed to write audit log"),
        });

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use gatewarden_core::{AccessCode, AccessTags, WebActor};
    use tempfile::TempDir;

    fn read(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_append_writes_header_once() {
        let dir = TempDir::new().unwrap();
        let log = CsvAuditLog::new(dir.path());
        let ts = Utc.with_ymd_and_hms(2024, 5, 7, 15, 0, 0).unwrap();

        let code = AccessCode::new(3, "4821", "Plumber")
            .unwrap()
            .with_tags(AccessTags::utility());
        let first = log.append(&GateAccessEvent::for_code(&code, ts)).unwrap();
        let second = log.append(&GateAccessEvent::denied(ts)).unwrap();
        assert_eq!(first, second);

        let lines = read(&first);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert!(lines[1].ends_with(",true,Plumber,PIN:****,3"));
        assert!(lines[2].ends_with(",false,unknown,PIN,0"));
        assert!(!lines[1].contains("4821"));
    }

    #[test]
    fn test_web_entry_is_quoted() {
        let dir = TempDir::new().unwrap();
        let log = CsvAuditLog::new(dir.path());
        let ts = Utc.with_ymd_and_hms(2024, 5, 7, 15, 0, 0).unwrap();

        let actor = WebActor::new(9, "Ada", "Lovelace");
        let path = log.append(&GateAccessEvent::for_web(&actor, ts)).unwrap();
        let lines = read(&path);
        assert!(lines[1].ends_with(",true,\"Lovelace, Ada\",Website,9"));
    }

    #[test]
    fn test_layout() {
        let log = CsvAuditLog::new("/logs");
        let at = Local.with_ymd_and_hms(2024, 5, 7, 8, 15, 0).unwrap();
        assert_eq!(log.day_file(&at), PathBuf::from("/logs/2024/05-May/7.csv"));
        assert_eq!(
            log.picture_file(&at),
            PathBuf::from("/logs/2024/05-May/pictures/2024-05-07_08_15AM.jpg")
        );
    }

    #[test]
    fn test_image_saved() {
        let dir = TempDir::new().unwrap();
        let log = CsvAuditLog::new(dir.path());
        let ts = Utc.with_ymd_and_hms(2024, 5, 7, 15, 0, 0).unwrap();
        let code = AccessCode::new(3, "4821", "Guest").unwrap();
        let event = GateAccessEvent::for_code(&code, ts).with_image(Some(vec![0xff, 0xd8]));

        log.append(&event).unwrap();
        let picture = log.picture_file(&ts.with_timezone(&Local));
        assert_eq!(fs::read(picture).unwrap(), vec![0xff, 0xd8]);
    }

    #[tokio::test]
    async fn test_flush_waits_for_pending_writes() {
        let dir = TempDir::new().unwrap();
        let log = CsvAuditLog::new(dir.path());
        let sink = AuditedSink::new(crate::memory::InMemoryStore::new(), log.clone());
        let ts = Utc.with_ymd_and_hms(2024, 5, 7, 15, 0, 0).unwrap();

        for id in 1..=3 {
            let actor = WebActor::new(id, "Ada", "Lovelace");
            sink.record(&GateAccessEvent::for_web(&actor, ts)).await.unwrap();
        }
        sink.flush().await;

        let lines = read(&log.day_file(&ts.with_timezone(&Local)));
        assert_eq!(lines.len(), 4);
        assert_eq!(sink.inner().events().await.len(), 3);

        // Still usable after a flush.
        sink.record(&GateAccessEvent::denied(ts)).await.unwrap();
        sink.flush().await;
        assert_eq!(read(&log.day_file(&ts.with_timezone(&Local))).len(), 5);
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("plain"), "plain");
        assert_eq!(quote("a,b"), "\"a,b\"");
        assert_eq!(quote("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
