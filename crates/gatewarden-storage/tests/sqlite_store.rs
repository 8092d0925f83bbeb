//! Integration tests for the SQLite store.
//!
//! Run with: cargo test --package gatewarden-storage --test sqlite_store

use chrono::{Duration, NaiveTime, Utc, Weekday};
use gatewarden_core::{
    AccessCode, AccessTags, AccessVia, Carrier, Contact, GateAccessEvent, ValidDays, WebActor,
};
use gatewarden_storage::{AuditedSink, CodeLookup, CsvAuditLog, Database, EventSink, SqliteStore};
use rstest::rstest;
use tempfile::TempDir;

async fn store() -> SqliteStore {
    let db = Database::in_memory().await.unwrap();
    SqliteStore::new(db.pool().clone())
}

#[tokio::test]
async fn test_migrations_create_tables() {
    let db = Database::in_memory().await.unwrap();

    for table in ["account_code", "contact", "gate_log"] {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?")
                .bind(table)
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(count, 1, "missing table {table}");
    }
}

#[tokio::test]
async fn test_file_database_in_new_directory() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("gate.db");
    let db = Database::open(&path).await.unwrap();
    let store = SqliteStore::new(db.pool().clone());
    assert_eq!(store.count_events(true).await.unwrap(), 0);
    db.close().await;
    assert!(path.exists());
}

#[tokio::test]
async fn test_code_round_trips_restrictions() {
    let store = store().await;
    let start = Utc::now().naive_utc() - Duration::days(1);
    let code = AccessCode::new(4, "4821", "Plumber")
        .unwrap()
        .with_tags(AccessTags::utility())
        .with_dates(Some(start), None)
        .with_hours(
            NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(2, 0, 0).unwrap(),
        )
        .with_days([Weekday::Sat, Weekday::Sun].into_iter().collect::<ValidDays>());

    let id = store.insert_code(&code).await.unwrap();
    let found = store.find_active_code("4821").await.unwrap().unwrap();

    assert_eq!(found.id, id);
    assert_eq!(found.label, "Plumber");
    assert!(found.tags.utility);
    assert_eq!(found.date_start, Some(start));
    assert_eq!(found.time_start, NaiveTime::from_hms_opt(22, 0, 0));
    assert!(found.valid_days.contains(Weekday::Sat));
    assert!(!found.valid_days.contains(Weekday::Wed));
}

#[rstest]
#[case("4821", true)]
#[case("4822", false)]
#[case("48210", false)]
#[case("482", false)]
#[case("48a1", false)]
#[tokio::test]
async fn test_find_active_code_exact_match(#[case] pin: &str, #[case] found: bool) {
    let store = store().await;
    store
        .insert_code(&AccessCode::new(1, "4821", "Guest").unwrap())
        .await
        .unwrap();
    assert_eq!(store.find_active_code(pin).await.unwrap().is_some(), found);
}

#[tokio::test]
async fn test_inactive_code_not_found() {
    let store = store().await;
    let id = store
        .insert_code(&AccessCode::new(1, "1234", "Old").unwrap())
        .await
        .unwrap();
    assert!(store.deactivate_code(id).await.unwrap());
    assert!(store.find_active_code("1234").await.unwrap().is_none());

    // A retired code can be issued again.
    store
        .insert_code(&AccessCode::new(2, "1234", "New").unwrap())
        .await
        .unwrap();
    let code = store.find_active_code("1234").await.unwrap().unwrap();
    assert_eq!(code.account_id, 2);
}

#[tokio::test]
async fn test_duplicate_active_code_rejected() {
    let store = store().await;
    store
        .insert_code(&AccessCode::new(1, "5555", "A").unwrap())
        .await
        .unwrap();
    assert!(
        store
            .insert_code(&AccessCode::new(2, "5555", "B").unwrap())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_deactivate_missing_code() {
    let store = store().await;
    assert!(!store.deactivate_code(999).await.unwrap());
    assert!(store.find_code_by_id(999).await.unwrap().is_none());
}

#[tokio::test]
async fn test_notify_contacts_personal_and_group() {
    let store = store().await;
    store
        .insert_contact(&Contact::email(4, "owner@example.com"))
        .await
        .unwrap();
    store
        .insert_contact(
            &Contact::sms(7, "5551234567", Carrier::Verizon).with_interests(AccessTags::utility()),
        )
        .await
        .unwrap();
    store
        .insert_contact(
            &Contact::email(8, "mailroom@example.com").with_interests(AccessTags {
                mail: true,
                ..AccessTags::default()
            }),
        )
        .await
        .unwrap();

    let personal = AccessCode::new(4, "1111", "Guest").unwrap();
    let recipients = store.find_notify_contacts(&personal).await.unwrap();
    assert_eq!(recipients.len(), 1);
    assert_eq!(recipients[0].email.as_deref(), Some("owner@example.com"));

    let plumber = AccessCode::new(4, "4821", "Plumber")
        .unwrap()
        .with_tags(AccessTags::utility());
    let recipients = store.find_notify_contacts(&plumber).await.unwrap();
    assert_eq!(recipients.len(), 1);
    assert_eq!(
        recipients[0].notify_address().as_deref(),
        Some("5551234567@vtext.com")
    );

    let courier = AccessCode::new(4, "2222", "Courier").unwrap().with_tags(AccessTags {
        utility: true,
        mail: true,
        ..AccessTags::default()
    });
    assert_eq!(store.find_notify_contacts(&courier).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_inactive_contact_skipped() {
    let store = store().await;
    let id = store
        .insert_contact(&Contact::email(4, "owner@example.com"))
        .await
        .unwrap();
    assert!(store.deactivate_contact(id).await.unwrap());
    assert!(store.find_account_contacts(4).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_record_and_read_back_events() {
    let store = store().await;
    let code = AccessCode::new(4, "4821", "Plumber")
        .unwrap()
        .with_tags(AccessTags::utility());
    let now = Utc::now();

    store.record(&GateAccessEvent::denied(now)).await.unwrap();
    store
        .record(&GateAccessEvent::for_code(&code, now + Duration::seconds(1)).with_image(Some(vec![1, 2, 3])))
        .await
        .unwrap();
    store
        .record(&GateAccessEvent::for_web(&WebActor::new(9, "Ada", "Lovelace"), now + Duration::seconds(2)))
        .await
        .unwrap();

    let events = store.recent_events(10).await.unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].via, AccessVia::Web);
    assert_eq!(events[0].actor, "Lovelace, Ada");
    assert_eq!(events[1].code_used.as_deref(), Some("4821"));
    assert_eq!(events[1].code_tags, "Utility");
    assert_eq!(events[1].image.as_deref(), Some(&[1u8, 2, 3][..]));
    assert!(!events[2].succeeded);

    assert_eq!(store.count_events(true).await.unwrap(), 2);
    assert_eq!(store.count_events(false).await.unwrap(), 1);
}

#[tokio::test]
async fn test_prune_removes_only_old_records() {
    let store = store().await;
    let old_code = store
        .insert_code(&AccessCode::new(1, "1111", "Old").unwrap())
        .await
        .unwrap();
    store
        .insert_code(&AccessCode::new(1, "2222", "Live").unwrap())
        .await
        .unwrap();
    store.deactivate_code(old_code).await.unwrap();

    let old_contact = store
        .insert_contact(&Contact::email(1, "old@example.com"))
        .await
        .unwrap();
    store.deactivate_contact(old_contact).await.unwrap();

    let now = Utc::now();
    store
        .record(&GateAccessEvent::denied(now - Duration::days(400)))
        .await
        .unwrap();
    store.record(&GateAccessEvent::denied(now)).await.unwrap();

    // Nothing is older than a year except the stale log row.
    let report = store.prune(now - Duration::days(365)).await.unwrap();
    assert_eq!(report.codes, 0);
    assert_eq!(report.contacts, 0);
    assert_eq!(report.gate_logs, 1);

    let report = store.prune(Utc::now() + Duration::seconds(1)).await.unwrap();
    assert_eq!(report.codes, 1);
    assert_eq!(report.contacts, 1);
    assert_eq!(report.gate_logs, 1);
    assert!(store.find_active_code("2222").await.unwrap().is_some());
}

#[tokio::test]
async fn test_audited_sink_writes_csv() {
    let dir = TempDir::new().unwrap();
    let audit = CsvAuditLog::new(dir.path());
    let sink = AuditedSink::new(store().await, audit.clone());

    let event = GateAccessEvent::for_web(&WebActor::new(9, "Ada", "Lovelace"), Utc::now());
    sink.record(&event).await.unwrap();
    assert_eq!(sink.inner().recent_events(1).await.unwrap().len(), 1);

    sink.flush().await;

    let path = audit.day_file(&event.timestamp.with_timezone(&chrono::Local));
    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents.lines().count(), 2);
    assert!(contents.contains("Website"), "audit file not written: {contents:?}");
}
