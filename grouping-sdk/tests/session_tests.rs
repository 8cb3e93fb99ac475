//! Session tests against a recording command service

use std::collections::HashSet;

use async_trait::async_trait;
use rstest::rstest;
use speaker_grouping::{
    CommandService, GroupingConfig, GroupingSession, Operation, PlayerId, PredefinedGroup,
    SdkError, SessionPhase, StateRecord, StateSnapshot,
};
use tokio::sync::Mutex;

// ============================================================================
// Test Helpers
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Join(String, Vec<String>),
    Unjoin(Vec<String>),
    VolumeAndMedia(String),
    Switch(String, bool),
}

/// Records every call; fails the operations named in `failing`
#[derive(Default)]
struct RecordingService {
    calls: Mutex<Vec<Call>>,
    failing: HashSet<&'static str>,
}

impl RecordingService {
    fn failing(operations: &[&'static str]) -> Self {
        Self {
            failing: operations.iter().copied().collect(),
            ..Self::default()
        }
    }

    async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, operation: &'static str, call: Call) -> Result<(), SdkError> {
        self.calls.lock().await.push(call);
        if self.failing.contains(operation) {
            return Err(SdkError::command(operation, "speaker did not respond"));
        }
        Ok(())
    }
}

fn strings(ids: &[PlayerId]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

#[async_trait]
impl CommandService for RecordingService {
    async fn join(&self, main: &PlayerId, members: &[PlayerId]) -> Result<(), SdkError> {
        self.record("join", Call::Join(main.to_string(), strings(members))).await
    }

    async fn unjoin(&self, members: &[PlayerId]) -> Result<(), SdkError> {
        self.record("unjoin", Call::Unjoin(strings(members))).await
    }

    async fn set_volume_and_media(&self, group: &PredefinedGroup) -> Result<(), SdkError> {
        self.record("set_volume_and_media", Call::VolumeAndMedia(group.name.clone()))
            .await
    }

    async fn set_switch(&self, entity_id: &str, on: bool) -> Result<(), SdkError> {
        self.record("set_switch", Call::Switch(entity_id.to_string(), on))
            .await
    }
}

fn player(name: &str, state: &str, members: &[&str]) -> StateRecord {
    let record = StateRecord::new(state).with_attribute("friendly_name", name);
    if members.is_empty() {
        record
    } else {
        record.with_group_members(members.iter().copied())
    }
}

/// Living Room leads Kitchen; Office and Patio are standalone
fn snapshot() -> StateSnapshot {
    let pair = ["media_player.living_room", "media_player.kitchen"];
    StateSnapshot::new()
        .with("media_player.living_room", player("Living Room", "playing", &pair))
        .with("media_player.kitchen", player("Kitchen", "playing", &pair))
        .with("media_player.office", player("Office", "idle", &[]))
        .with("media_player.patio", player("Patio", "paused", &[]))
}

fn id(id: &str) -> PlayerId {
    PlayerId::new(id)
}

fn predefined_config() -> GroupingConfig {
    GroupingConfig::from_json(
        r#"{
            "predefinedGroups": [
                {"name": "Work", "entities": ["media_player.office", {"player": "media_player.patio", "volume": 10}], "media": "Focus"},
                {"name": "Everywhere but the office", "entities": ["media_player.office"], "excludeItemsInEntitiesList": true}
            ]
        }"#,
    )
    .unwrap()
}

// ============================================================================
// Apply
// ============================================================================

#[tokio::test]
async fn test_apply_issues_join_then_unjoin() {
    let service = RecordingService::default();
    let mut session = GroupingSession::new(GroupingConfig::default(), snapshot(), None);

    session.toggle(&id("media_player.office")).unwrap();
    session.toggle(&id("media_player.kitchen")).unwrap();
    let report = session.apply(&service).await.unwrap();

    assert!(report.is_success());
    assert_eq!(
        service.calls().await,
        vec![
            Call::Join(
                "media_player.living_room".to_string(),
                vec!["media_player.office".to_string()]
            ),
            Call::Unjoin(vec!["media_player.kitchen".to_string()]),
        ]
    );
    assert_eq!(report.active_player_changed, None);
    assert_eq!(session.phase(), SessionPhase::Idle);
}

#[tokio::test]
async fn test_predefined_group_applies_volume_and_media_last() {
    let service = RecordingService::default();
    let mut session = GroupingSession::new(predefined_config(), snapshot(), None);

    session.select_predefined("Work").unwrap();
    let report = session.apply(&service).await.unwrap();

    let calls = service.calls().await;
    assert_eq!(
        calls,
        vec![
            Call::Join(
                "media_player.office".to_string(),
                vec!["media_player.office".to_string(), "media_player.patio".to_string()]
            ),
            Call::Unjoin(vec!["media_player.kitchen".to_string()]),
            Call::VolumeAndMedia("Work".to_string()),
        ]
    );
    assert_eq!(report.active_player_changed, Some(id("media_player.office")));
    assert_eq!(
        session.active_group().map(|g| g.main_id().clone()),
        Some(id("media_player.office"))
    );
}

#[tokio::test]
async fn test_failed_join_still_issues_unjoin() {
    let service = RecordingService::failing(&["join"]);
    let mut session = GroupingSession::new(GroupingConfig::default(), snapshot(), None);

    session.toggle(&id("media_player.patio")).unwrap();
    session.toggle(&id("media_player.kitchen")).unwrap();
    let report = session.apply(&service).await.unwrap();

    assert_eq!(service.calls().await.len(), 2);
    assert!(!report.is_success());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].operation.name(), "join");
    assert!(matches!(report.failures[0].error, SdkError::Command { .. }));
    assert!(matches!(report.completed.as_slice(), [Operation::Unjoin { .. }]));
    assert!(session.pending().is_empty());
}

#[tokio::test]
async fn test_cancel_issues_nothing() {
    let service = RecordingService::default();
    let mut session = GroupingSession::new(GroupingConfig::default(), snapshot(), None);

    session.toggle(&id("media_player.office")).unwrap();
    session.cancel();

    assert!(matches!(
        session.apply(&service).await,
        Err(SdkError::NothingToApply)
    ));
    assert!(service.calls().await.is_empty());
}

#[tokio::test]
async fn test_deselecting_main_hands_over() {
    let service = RecordingService::default();
    let mut session = GroupingSession::new(GroupingConfig::default(), snapshot(), None);

    session.toggle(&id("media_player.living_room")).unwrap();
    let report = session.apply(&service).await.unwrap();

    assert!(report.changes.is_noop());
    assert!(service.calls().await.is_empty());
    assert_eq!(report.active_player_changed, Some(id("media_player.kitchen")));
}

// ============================================================================
// Notification
// ============================================================================

#[rstest]
#[case::switching_allowed(false, Some("media_player.kitchen"))]
#[case::configured_player_kept(true, None)]
#[tokio::test]
async fn test_main_change_notification(#[case] dont_switch: bool, #[case] expected: Option<&str>) {
    let config = GroupingConfig {
        dont_switch_player_when_grouping: dont_switch,
        ..GroupingConfig::default()
    };
    let service = RecordingService::default();
    let mut session = GroupingSession::new(config, snapshot(), None);

    session.toggle(&id("media_player.living_room")).unwrap();
    let report = session.apply(&service).await.unwrap();

    assert_eq!(report.active_player_changed, expected.map(id));
}

#[tokio::test]
async fn test_unjoined_configured_player_is_notified() {
    let config = GroupingConfig {
        entity_id: Some(id("media_player.kitchen")),
        dont_switch_player_when_grouping: true,
        ..GroupingConfig::default()
    };
    let service = RecordingService::default();
    let mut session = GroupingSession::new(config, snapshot(), Some(id("media_player.living_room")));

    session.toggle(&id("media_player.kitchen")).unwrap();
    let report = session.apply(&service).await.unwrap();

    assert_eq!(
        service.calls().await,
        vec![Call::Unjoin(vec!["media_player.kitchen".to_string()])]
    );
    assert_eq!(report.active_player_changed, Some(id("media_player.kitchen")));
}

// ============================================================================
// Automation
// ============================================================================

#[tokio::test]
async fn test_automation_sets_room_switches_instead_of_grouping() {
    let config = GroupingConfig {
        ags_system_switch: Some("switch.ags".to_string()),
        ags_room_switch_prefix: Some("switch.ags_".to_string()),
        ..GroupingConfig::default()
    };
    let snapshot = snapshot().with("switch.ags", StateRecord::new("on"));
    let service = RecordingService::default();
    let mut session = GroupingSession::new(config, snapshot, None);
    assert!(session.automation_active());

    session.toggle(&id("media_player.office")).unwrap();
    session.apply(&service).await.unwrap();

    let mut calls = service.calls().await;
    calls.sort_by_key(|call| format!("{:?}", call));
    assert_eq!(
        calls,
        vec![
            Call::Switch("switch.ags_kitchen".to_string(), true),
            Call::Switch("switch.ags_living_room".to_string(), true),
            Call::Switch("switch.ags_office".to_string(), true),
            Call::Switch("switch.ags_patio".to_string(), false),
        ]
    );
}

#[tokio::test]
async fn test_automation_primary_speaker_picks_active_group() {
    let config = GroupingConfig {
        ags_status_sensor: Some("sensor.ags_status".to_string()),
        ags_primary_speaker_sensor: Some("sensor.ags_primary".to_string()),
        ..GroupingConfig::default()
    };
    let snapshot = snapshot()
        .with("sensor.ags_status", StateRecord::new("ON"))
        .with("sensor.ags_primary", StateRecord::new("media_player.patio"));

    let session = GroupingSession::new(config, snapshot, Some(id("media_player.office")));
    assert_eq!(
        session.active_group().map(|g| g.main_id().clone()),
        Some(id("media_player.patio"))
    );
}

#[tokio::test]
async fn test_switched_off_automation_groups_speakers() {
    let config = GroupingConfig {
        ags_system_switch: Some("switch.ags".to_string()),
        ags_status_sensor: Some("sensor.ags_status".to_string()),
        ags_room_switch_prefix: Some("switch.ags_".to_string()),
        ..GroupingConfig::default()
    };
    let snapshot = snapshot()
        .with("switch.ags", StateRecord::new("off"))
        .with("sensor.ags_status", StateRecord::new("on"));
    let service = RecordingService::default();
    let mut session = GroupingSession::new(config, snapshot, None);
    assert!(!session.automation_active());
    assert!(session.automation_shown());

    session.toggle(&id("media_player.office")).unwrap();
    session.toggle(&id("media_player.kitchen")).unwrap();
    session.apply(&service).await.unwrap();

    assert_eq!(
        service.calls().await,
        vec![
            Call::Join(
                "media_player.living_room".to_string(),
                vec!["media_player.office".to_string()]
            ),
            Call::Unjoin(vec!["media_player.kitchen".to_string()]),
        ]
    );
}

fn switch_config() -> GroupingConfig {
    GroupingConfig {
        ags_system_switch: Some("switch.ags".to_string()),
        ags_room_switch_prefix: Some("switch.ags_".to_string()),
        ..GroupingConfig::default()
    }
}

#[rstest]
#[case::turn_on(true)]
#[case::turn_off(false)]
#[tokio::test]
async fn test_set_automation_system(#[case] on: bool) {
    let service = RecordingService::default();
    let session = GroupingSession::new(switch_config(), snapshot(), None);

    let operation = session.set_automation_system(on).unwrap();
    operation.run(&service).await.unwrap();

    assert_eq!(service.calls().await, vec![Call::Switch("switch.ags".to_string(), on)]);

    let unconfigured = GroupingSession::new(GroupingConfig::default(), snapshot(), None);
    assert!(matches!(
        unconfigured.set_automation_system(on),
        Err(SdkError::Config(_))
    ));
}

#[tokio::test]
async fn test_set_room_switch_uses_player_object_id() {
    let service = RecordingService::default();
    let session = GroupingSession::new(switch_config(), snapshot(), None);

    let operation = session
        .set_room_switch(&id("media_player.living_room"), false)
        .unwrap();
    operation.run(&service).await.unwrap();

    assert_eq!(
        service.calls().await,
        vec![Call::Switch("switch.ags_living_room".to_string(), false)]
    );
    assert!(matches!(
        session.set_room_switch(&id("media_player.gone"), true),
        Err(SdkError::StateError(_))
    ));
}

#[test]
fn test_room_switch_state() {
    let snap = snapshot()
        .with("switch.ags_office", StateRecord::new("on"))
        .with("switch.ags_patio", StateRecord::new("off"));
    let session = GroupingSession::new(switch_config(), snap, None);

    assert!(session.room_switch_state(&id("media_player.office")));
    assert!(!session.room_switch_state(&id("media_player.patio")));
    assert!(!session.room_switch_state(&id("media_player.kitchen")));

    let no_prefix = GroupingSession::new(GroupingConfig::default(), snapshot(), None);
    assert!(!no_prefix.room_switch_state(&id("media_player.office")));
}

// ============================================================================
// Refresh
// ============================================================================

#[tokio::test]
async fn test_refresh_during_apply_keeps_committed_plan() {
    let service = RecordingService::default();
    let mut session = GroupingSession::new(GroupingConfig::default(), snapshot(), None);
    session.toggle(&id("media_player.office")).unwrap();

    let plan = session.begin_apply().unwrap();
    session.refresh(snapshot());
    assert_eq!(session.phase(), SessionPhase::Applying);

    let report = plan.execute(&service).await;
    session.finish_apply(&report);

    assert_eq!(service.calls().await.len(), 1);
    assert_eq!(session.phase(), SessionPhase::Idle);
}
