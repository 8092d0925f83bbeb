//! End-to-end tests for the access path.
//!
//! Mock GPIO, camera and display with the in-memory store; time is paused
//! so gate pulses complete instantly.
//!
//! Run with: cargo test --package gatewarden-access --test end_to_end

use chrono::{Local, NaiveTime, TimeZone, Weekday};
use gatewarden_access::{
    AccessError, AccessOrchestrator, OrchestratorSettings, RecordingNotifier, run_keypad,
};
use gatewarden_core::{
    AccessCode, AccessTags, AccessVia, ChangeSet, Contact, DisplayMessages, KeyEvent, LineNumber,
    PinState, ValidDays, WebActor,
};
use gatewarden_gate::{GateActuator, GateSettings};
use gatewarden_hardware::mock::{MockCamera, MockDisplay, MockGpio, MockGpioHandle};
use gatewarden_hardware::{CameraBackend, DisplayBackend};
use gatewarden_keypad::{KeypadLayout, KeypadMatrixDecoder, KeypadSession, PinEntryAccumulator};
use gatewarden_storage::{CodeLookup, InMemoryStore, StorageError, StorageResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const GATE: LineNumber = 26;
const IMAGE: &[u8] = &[0xff, 0xd8, 0xff];

type Orchestrator = AccessOrchestrator<InMemoryStore, InMemoryStore, RecordingNotifier>;

struct Harness {
    orchestrator: Arc<Orchestrator>,
    store: Arc<InMemoryStore>,
    notifier: Arc<RecordingNotifier>,
    gpio: MockGpioHandle,
    camera: MockCamera,
    display: MockDisplay,
}

impl Harness {
    async fn new() -> Self {
        let (gpio, handle) = MockGpio::new();
        let gate = GateActuator::new(
            Arc::new(gpio),
            GateSettings {
                line: GATE,
                ..GateSettings::default()
            },
        )
        .unwrap();

        let store = Arc::new(InMemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let camera = MockCamera::new(IMAGE.to_vec());
        let display = MockDisplay::new();

        let orchestrator = AccessOrchestrator::new(
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&notifier),
            Arc::new(gate),
            Arc::new(camera.clone()) as Arc<dyn CameraBackend>,
            OrchestratorSettings {
                site_name: "Oak Hollow".to_string(),
                message_ttl: Duration::from_secs(2),
            },
        )
        .with_display(Arc::new(display.clone()) as Arc<dyn DisplayBackend>);

        Self {
            orchestrator: Arc::new(orchestrator),
            store,
            notifier,
            gpio: handle,
            camera,
            display,
        }
    }

    /// Seed the plumber code plus one personal and one utility contact.
    async fn with_plumber(self) -> Self {
        self.store
            .add_code(
                AccessCode::new(4, "4821", "Plumber")
                    .unwrap()
                    .with_tags(AccessTags::utility()),
            )
            .await;
        self.store
            .add_contact(Contact::email(4, "owner@example.com"))
            .await;
        self.store
            .add_contact(Contact::email(7, "utility@example.com").with_interests(AccessTags::utility()))
            .await;
        self
    }

    /// Gate writes after the initial release at setup.
    fn pulses(&self) -> Vec<bool> {
        self.gpio.writes_to(GATE).into_iter().skip(1).collect()
    }
}

/// Let spawned notification tasks run.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[tokio::test(start_paused = true)]
async fn test_valid_utility_pin_opens_and_notifies_group() {
    let h = Harness::new().await.with_plumber().await;

    let event = h.orchestrator.handle_pin("4821").await.unwrap();
    settle().await;

    assert_eq!(h.pulses(), vec![true, false]);
    assert!(event.succeeded);
    assert_eq!(event.via, AccessVia::Pin);
    assert_eq!(event.actor, "Plumber");
    assert_eq!(event.image.as_deref(), Some(IMAGE));

    let events = h.store.events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0], event);

    let sent = h.notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipients, vec!["utility@example.com".to_string()]);
    assert_eq!(sent[0].subject, "Oak Hollow Gate Notification");
    assert!(sent[0].body.ends_with("] Plumber is entering the neighborhood"));

    assert_eq!(h.display.last().as_deref(), Some(DisplayMessages::WELCOME));
    assert_eq!(h.camera.captures(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_personal_code_notifies_account_holder() {
    let h = Harness::new().await.with_plumber().await;
    h.store
        .add_code(AccessCode::new(4, "7777", "Grandma").unwrap())
        .await;

    h.orchestrator.handle_pin("7777").await.unwrap();
    settle().await;

    let sent = h.notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipients, vec!["owner@example.com".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_inactive_code_is_denied_without_touching_gate() {
    let h = Harness::new().await.with_plumber().await;
    h.store
        .add_code(AccessCode::new(4, "1234", "Old").unwrap().deactivated())
        .await;

    let err = h.orchestrator.handle_pin("1234").await.unwrap_err();
    settle().await;

    assert!(matches!(err, AccessError::UnknownOrExpiredCode));
    assert!(h.pulses().is_empty());
    assert!(h.notifier.sent().await.is_empty());

    let events = h.store.events().await;
    assert_eq!(events.len(), 1);
    assert!(!events[0].succeeded);
    assert_eq!(events[0].via, AccessVia::Unknown);
    assert_eq!(events[0].actor, "unknown");
    assert_eq!(h.display.last().as_deref(), Some(DisplayMessages::INVALID_PIN));

    // Denials still get a picture of whoever was at the keypad.
    assert_eq!(h.camera.captures(), 1);
    assert_eq!(events[0].image.as_deref(), Some(IMAGE));
}

/// A code store whose every query fails.
struct UnreachableStore;

impl CodeLookup for UnreachableStore {
    async fn find_active_code(&self, _pin: &str) -> StorageResult<Option<AccessCode>> {
        Err(StorageError::Validation("database is locked".to_string()))
    }

    async fn find_account_contacts(&self, _account_id: i64) -> StorageResult<Vec<Contact>> {
        Err(StorageError::Validation("database is locked".to_string()))
    }

    async fn find_group_contacts(&self, _tags: AccessTags) -> StorageResult<Vec<Contact>> {
        Err(StorageError::Validation("database is locked".to_string()))
    }
}

#[tokio::test(start_paused = true)]
async fn test_lookup_failure_is_recorded_as_denial() {
    let (gpio, handle) = MockGpio::new();
    let gate = GateActuator::new(
        Arc::new(gpio),
        GateSettings {
            line: GATE,
            ..GateSettings::default()
        },
    )
    .unwrap();
    let sink = Arc::new(InMemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let orchestrator = AccessOrchestrator::new(
        Arc::new(UnreachableStore),
        Arc::clone(&sink),
        Arc::clone(&notifier),
        Arc::new(gate),
        Arc::new(MockCamera::new(IMAGE.to_vec())) as Arc<dyn CameraBackend>,
        OrchestratorSettings::default(),
    );

    let err = orchestrator.handle_pin("4821").await.unwrap_err();
    settle().await;

    assert!(matches!(err, AccessError::Storage(_)));
    let events = sink.events().await;
    assert_eq!(events.len(), 1);
    assert!(!events[0].succeeded);
    assert_eq!(events[0].via, AccessVia::Unknown);
    // Only the release written at setup.
    assert_eq!(handle.writes_to(GATE), vec![false]);
    assert!(notifier.sent().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unknown_and_expired_look_the_same() {
    let h = Harness::new().await.with_plumber().await;
    let weekend = [Weekday::Sat, Weekday::Sun]
        .into_iter()
        .collect::<ValidDays>();
    h.store
        .add_code(AccessCode::new(4, "5150", "Weekend").unwrap().with_days(weekend))
        .await;

    // 2024-05-08 is a Wednesday.
    let wednesday = Local.with_ymd_and_hms(2024, 5, 8, 12, 0, 0).unwrap();
    let expired = h
        .orchestrator
        .handle_pin_at("5150", wednesday)
        .await
        .unwrap_err();
    let unknown = h
        .orchestrator
        .handle_pin_at("9999", wednesday)
        .await
        .unwrap_err();

    assert_eq!(expired.to_string(), unknown.to_string());
    let events = h.store.events().await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], events[1]);
    assert!(h.pulses().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_overnight_window() {
    let h = Harness::new().await;
    h.store
        .add_code(AccessCode::new(4, "2200", "Night shift").unwrap().with_hours(
            NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(2, 0, 0).unwrap(),
        ))
        .await;

    let late = Local.with_ymd_and_hms(2024, 5, 8, 23, 30, 0).unwrap();
    let noon = Local.with_ymd_and_hms(2024, 5, 8, 12, 0, 0).unwrap();
    assert!(h.orchestrator.handle_pin_at("2200", late).await.is_ok());
    assert!(h.orchestrator.handle_pin_at("2200", noon).await.is_err());
    assert_eq!(h.pulses(), vec![true, false]);
}

#[tokio::test(start_paused = true)]
async fn test_web_entry_opens_without_notifying() {
    let h = Harness::new().await.with_plumber().await;

    let event = h
        .orchestrator
        .handle_web(&WebActor::new(4, "Ada", "Lovelace"))
        .await
        .unwrap();
    settle().await;

    assert_eq!(event.via, AccessVia::Web);
    assert_eq!(event.actor, "Lovelace, Ada");
    assert_eq!(event.account_id, Some(4));
    assert_eq!(h.pulses(), vec![true, false]);
    assert!(h.notifier.sent().await.is_empty());
    assert_eq!(h.store.events().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_web_and_pin_together_pulse_once() {
    let h = Harness::new().await.with_plumber().await;
    let actor = WebActor::new(4, "Ada", "Lovelace");

    let (web, pin) = tokio::join!(
        h.orchestrator.handle_web(&actor),
        h.orchestrator.handle_pin("4821")
    );

    assert!(web.unwrap().succeeded);
    assert!(pin.unwrap().succeeded);
    assert_eq!(h.pulses(), vec![true, false]);
    assert_eq!(h.store.events().await.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_gate_fault_is_recorded_and_surfaced() {
    let h = Harness::new().await.with_plumber().await;
    h.gpio.fail_writes(GATE);

    let err = h.orchestrator.handle_pin("4821").await.unwrap_err();
    settle().await;

    assert!(matches!(err, AccessError::Actuation(_)));
    let events = h.store.events().await;
    assert_eq!(events.len(), 1);
    assert!(!events[0].succeeded);
    assert_eq!(events[0].via, AccessVia::Pin);
    assert!(h.notifier.sent().await.is_empty());
    assert_eq!(h.display.last().as_deref(), Some(DisplayMessages::GATE_FAULT));
}

#[tokio::test(start_paused = true)]
async fn test_camera_failure_does_not_block_entry() {
    let h = Harness::new().await.with_plumber().await;
    h.camera.set_failing(true);

    let event = h.orchestrator.handle_pin("4821").await.unwrap();
    assert!(event.image.is_none());
    assert_eq!(h.pulses(), vec![true, false]);
}

#[tokio::test(start_paused = true)]
async fn test_notifier_failure_is_swallowed() {
    let h = Harness::new().await.with_plumber().await;
    h.notifier.set_failing(true);

    assert!(h.orchestrator.handle_pin("4821").await.is_ok());
    settle().await;
    assert_eq!(h.notifier.sent().await.len(), 1);
}

fn layout() -> KeypadLayout {
    KeypadLayout::new([5, 6, 13, 19], [17, 27, 22]).unwrap()
}

fn session() -> KeypadSession {
    KeypadSession::new(
        KeypadMatrixDecoder::new(layout()),
        PinEntryAccumulator::new(None, Duration::from_secs(2)),
    )
}

async fn tap(tx: &mpsc::Sender<ChangeSet>, key: KeyEvent) {
    let (row, col) = layout().lines_for(key).unwrap();
    let press: ChangeSet = [(row, PinState::Asserted), (col, PinState::Asserted)]
        .into_iter()
        .collect();
    let release: ChangeSet = [(row, PinState::Deasserted), (col, PinState::Deasserted)]
        .into_iter()
        .collect();
    tx.send(press).await.unwrap();
    tx.send(release).await.unwrap();
}

async fn type_keys(tx: &mpsc::Sender<ChangeSet>, keys: &str) {
    for c in keys.chars() {
        tap(tx, KeyEvent::from_char(c).unwrap()).await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_keypad_task_submits_pin() {
    let h = Harness::new().await.with_plumber().await;
    let (tx, rx) = mpsc::channel(32);
    let shutdown = CancellationToken::new();
    let task = tokio::spawn(run_keypad(
        session(),
        rx,
        Arc::clone(&h.orchestrator),
        shutdown.clone(),
    ));

    type_keys(&tx, "4821#").await;
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(h.pulses(), vec![true, false]);
    let events = h.store.events().await;
    assert_eq!(events.len(), 1);
    assert!(events[0].succeeded);

    shutdown.cancel();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_keypad_overflow_then_enter_submits_nothing() {
    let h = Harness::new().await.with_plumber().await;
    let (tx, rx) = mpsc::channel(32);
    let task = tokio::spawn(run_keypad(
        session(),
        rx,
        Arc::clone(&h.orchestrator),
        CancellationToken::new(),
    ));

    type_keys(&tx, "48214821482#").await;
    drop(tx);
    task.await.unwrap();

    assert!(h.store.events().await.is_empty());
    assert!(h.pulses().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_keypad_clear_key_discards_entry() {
    let h = Harness::new().await.with_plumber().await;
    let (tx, rx) = mpsc::channel(32);
    let task = tokio::spawn(run_keypad(
        session(),
        rx,
        Arc::clone(&h.orchestrator),
        CancellationToken::new(),
    ));

    type_keys(&tx, "99*4821#").await;
    drop(tx);
    task.await.unwrap();

    let events = h.store.events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].actor, "Plumber");
}
