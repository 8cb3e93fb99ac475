//! Grouping session walkthrough with a printing command service
//!
//! Builds a state snapshot by hand, adds one speaker to the playing group,
//! removes another, then starts a predefined group.
//!
//! Run with: GROUPING_LOG_MODE=development cargo run -p speaker-grouping --example apply_grouping

use async_trait::async_trait;
use speaker_grouping::{
    CommandService, GroupingConfig, GroupingSession, PlayerId, PredefinedGroup, SdkError,
    StateRecord, StateSnapshot,
};

struct PrintingService;

#[async_trait]
impl CommandService for PrintingService {
    async fn join(&self, main: &PlayerId, members: &[PlayerId]) -> Result<(), SdkError> {
        println!("  join {:?} -> {}", members, main);
        Ok(())
    }

    async fn unjoin(&self, members: &[PlayerId]) -> Result<(), SdkError> {
        println!("  unjoin {:?}", members);
        Ok(())
    }

    async fn set_volume_and_media(&self, group: &PredefinedGroup) -> Result<(), SdkError> {
        for member in &group.entities {
            println!(
                "  {}: volume {:?}",
                member.player.name,
                group.volume_for(&member.player.id)
            );
        }
        if let Some(media) = &group.media {
            println!("  play {}", media);
        }
        Ok(())
    }

    async fn set_switch(&self, entity_id: &str, on: bool) -> Result<(), SdkError> {
        println!("  {} -> {}", entity_id, if on { "on" } else { "off" });
        Ok(())
    }
}

fn snapshot() -> StateSnapshot {
    let pair = ["media_player.living_room", "media_player.kitchen"];
    StateSnapshot::new()
        .with(
            "media_player.living_room",
            StateRecord::new("playing")
                .with_attribute("friendly_name", "Living Room")
                .with_group_members(pair),
        )
        .with(
            "media_player.kitchen",
            StateRecord::new("playing")
                .with_attribute("friendly_name", "Kitchen")
                .with_group_members(pair),
        )
        .with(
            "media_player.office",
            StateRecord::new("idle").with_attribute("friendly_name", "Office"),
        )
        .with(
            "media_player.patio",
            StateRecord::new("idle").with_attribute("friendly_name", "Patio"),
        )
}

fn print_items(session: &GroupingSession) {
    for item in session.items() {
        println!(
            "  [{}] {}{}",
            if item.is_selected { "x" } else { " " },
            item.name(),
            if item.is_main { " (main)" } else { "" }
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    grouping_state::init_logging_from_env()?;

    let config = GroupingConfig::from_json(
        r#"{
            "predefinedGroups": [
                {"name": "Outside", "entities": [{"player": "media_player.patio", "volume": 40}], "media": "Summer Playlist"}
            ]
        }"#,
    )?;
    let mut session = GroupingSession::new(config, snapshot(), None);

    println!("Current grouping:");
    print_items(&session);

    session.toggle(&PlayerId::new("media_player.office"))?;
    session.toggle(&PlayerId::new("media_player.kitchen"))?;
    println!("\nEdited grouping:");
    print_items(&session);

    println!("\nApplying:");
    let report = session.apply(&PrintingService).await?;
    println!("  {} commands issued", report.completed.len());

    session.select_predefined("Outside")?;
    println!("\nApplying predefined group:");
    let report = session.apply(&PrintingService).await?;
    if let Some(player) = report.active_player_changed {
        println!("\nActive player is now {}", player);
    }

    Ok(())
}
