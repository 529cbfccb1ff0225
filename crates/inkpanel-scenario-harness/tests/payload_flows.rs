use inkpanel_core::config::{CONFIRMATION_TEXT, PERSIST_KEY};
use inkpanel_core::mock::MemoryStore;
use inkpanel_core::{Action, ContentView, InboxError, MainScreen, RecordKind, ReminderRecord};
use inkpanel_scenario_harness::ScenarioHarness;
use serde_json::Value;

const LISTS_PAYLOAD: &str = r#"{
    "reminders": [
        {"title": "Pay rent", "date": "2024-05-01", "time": "09:00"},
        {"title": "Call mom", "date": "2024-05-02", "time": "18:30"}
    ],
    "calendar": [
        {"title": "Standup", "date": "2024-05-02", "time": "10:00"},
        {"title": "Dentist", "date": "2024-05-03", "time": "14:15"},
        {"title": "Book club", "date": "2024-05-04", "time": "19:00"}
    ]
}"#;

fn setup_harness() -> ScenarioHarness {
    let mut harness = ScenarioHarness::new();
    harness.boot();
    harness
}

fn same_json(a: &str, b: &str) -> bool {
    let a: Value = serde_json::from_str(a).expect("left side is JSON");
    let b: Value = serde_json::from_str(b).expect("right side is JSON");
    a == b
}

#[test]
fn message_payload_takes_over_screen() {
    let mut harness = setup_harness();
    let updates_before = harness.display().update_count();

    harness.submit(r#"{"message": "Water the plants"}"#).unwrap();
    assert!(harness.agent_mut().process_inbox());

    assert_eq!(
        harness.current_view(),
        ContentView::Message("Water the plants")
    );
    assert_eq!(harness.next_action(), Some(Action::RefreshScreen));
    assert!(harness.agent().skip_clock_ticks() > 0);

    harness.pump_until_idle();
    assert_eq!(harness.display().update_count(), updates_before + 1);
    assert!(harness.display().black_pixels() > 0);
    assert_eq!(harness.store().value(PERSIST_KEY), None);
}

#[test]
fn reminder_payload_replaces_list_and_persists_blob() {
    let mut harness = setup_harness();
    let payload = r#"{"reminders":[{"title":"Pay rent","date":"2024-05-01","time":"09:00"}]}"#;

    harness.submit(payload).unwrap();
    harness.pump_until_idle();

    assert_eq!(
        harness.views().reminders().items(),
        &[ReminderRecord {
            title: "Pay rent".to_string(),
            date: "2024-05-01".to_string(),
            time: "09:00".to_string(),
            kind: RecordKind::Reminder,
        }]
    );
    assert!(harness.views().events().is_empty());
    assert_eq!(harness.current_view(), ContentView::Message(CONFIRMATION_TEXT));

    let stored = harness
        .store()
        .committed_value(PERSIST_KEY)
        .expect("blob committed");
    assert!(same_json(&stored, payload));
}

#[test]
fn persisted_lists_survive_power_cycle() {
    let mut first = setup_harness();
    first.submit(LISTS_PAYLOAD).unwrap();
    first.pump_until_idle();

    let store: MemoryStore = first.store().clone();
    store.power_cycle();

    let mut second = ScenarioHarness::with_store(store);
    second.boot();

    assert_eq!(
        second.views().reminders().items(),
        first.views().reminders().items()
    );
    assert_eq!(second.views().events().items(), first.views().events().items());
    assert_eq!(second.views().events().len(), 3);
    // A restored blob is not new content.
    assert_eq!(second.current_view(), ContentView::Main(MainScreen::Status));
}

#[test]
fn same_payload_twice_gives_identical_lists() {
    let mut harness = setup_harness();
    harness.submit(LISTS_PAYLOAD).unwrap();
    harness.pump_until_idle();
    let reminders = harness.views().reminders().items().to_vec();
    let events = harness.views().events().items().to_vec();

    harness.submit(LISTS_PAYLOAD).unwrap();
    harness.pump_until_idle();

    assert_eq!(harness.views().reminders().items(), reminders.as_slice());
    assert_eq!(harness.views().events().items(), events.as_slice());
    assert_eq!(harness.views().reminders().len(), 2);
}

#[test]
fn malformed_payload_changes_nothing() {
    let mut harness = setup_harness();
    harness.submit(LISTS_PAYLOAD).unwrap();
    harness.pump_until_idle();
    let commits = harness.store().commit_count();
    let skip = harness.agent().skip_clock_ticks();

    harness.submit(r#"{"reminders": [{"title": "#).unwrap();
    assert_eq!(harness.pump_until_idle(), 1);

    assert_eq!(harness.views().reminders().len(), 2);
    assert_eq!(harness.views().events().len(), 3);
    assert_eq!(harness.current_view(), ContentView::Message(CONFIRMATION_TEXT));
    assert_eq!(harness.store().commit_count(), commits);
    assert_eq!(harness.agent().skip_clock_ticks(), skip);
    assert!(same_json(
        &harness.store().committed_value(PERSIST_KEY).unwrap(),
        LISTS_PAYLOAD
    ));
}

#[test]
fn bad_entries_are_skipped_not_fatal() {
    let mut harness = setup_harness();
    harness
        .submit(
            r#"{"calendar": [
                {"title": "Standup", "date": "2024-05-02", "time": "10:00"},
                {"title": "No date"},
                42
            ]}"#,
        )
        .unwrap();
    harness.pump_until_idle();

    assert_eq!(harness.views().events().len(), 1);
    assert_eq!(harness.views().events().items()[0].title, "Standup");
}

#[test]
fn invalid_stored_blob_is_erased_at_boot() {
    for blob in ["not json at all", r#"{"message": "left over"}"#] {
        let store = MemoryStore::new().with_entry(PERSIST_KEY, blob);
        let mut harness = ScenarioHarness::with_store(store.clone());
        harness.boot();

        assert_eq!(store.committed_value(PERSIST_KEY), None, "blob {:?}", blob);
        assert!(harness.views().reminders().is_empty());
        assert!(harness.views().events().is_empty());
    }
}

#[test]
fn message_and_lists_in_one_payload_ends_on_message() {
    let mut harness = setup_harness();
    harness
        .submit(
            r#"{"reminders":[{"title":"a","date":"d","time":"t"}],"message":"Lists synced"}"#,
        )
        .unwrap();
    harness.pump_until_idle();

    assert_eq!(harness.views().reminders().len(), 1);
    assert_eq!(harness.current_view(), ContentView::Message("Lists synced"));
    assert!(harness.store().committed_value(PERSIST_KEY).is_some());
}

#[test]
fn inbox_rejects_payload_larger_than_buffer() {
    let harness = setup_harness();
    let huge = format!(r#"{{"message": "{}"}}"#, "x".repeat(4096));
    assert!(matches!(
        harness.submit(&huge),
        Err(InboxError::Oversize { .. })
    ));
    assert!(harness.pending_actions().is_empty());
}
