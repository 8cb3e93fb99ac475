//! # Speaker Grouping - edit sessions over multi-room speaker groups
//!
//! Wraps the pure `grouping-state` engine in a session that holds one
//! grouping edit and issues it through a [`CommandService`]:
//!
//! ```rust,no_run
//! use speaker_grouping::{GroupingConfig, GroupingSession, StateSnapshot};
//! # use speaker_grouping::CommandService;
//!
//! # async fn run(service: &dyn CommandService, json: &str) -> Result<(), speaker_grouping::SdkError> {
//! let config = GroupingConfig::from_json(r#"{"entityId": "media_player.kitchen"}"#)?;
//! let snapshot = StateSnapshot::from_json(json)?;
//!
//! let mut session = GroupingSession::new(config, snapshot, None);
//! session.toggle(&"media_player.den".into())?;
//!
//! let report = session.apply(service).await?;
//! if let Some(player) = report.active_player_changed {
//!     println!("Now controlling {}", player);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! speaker-grouping (GroupingSession, CommandService)
//!     ↓
//! grouping-state (topology, active player, diff)
//! ```
//!
//! The session decides; the command service acts. Commands are issued one at
//! a time in a fixed order: joins, unjoins, then predefined volume and media.

pub use command::{CommandService, Operation};
pub use config::GroupingConfig;
pub use error::SdkError;
pub use session::{ApplyPlan, ApplyReport, CommandFailure, GroupingSession, SessionPhase};

// Re-export commonly used types from grouping-state
pub use grouping_state::{
    Group, GroupingChanges, GroupingItem, PlayerId, PredefinedGroup, StateRecord, StateSnapshot,
};

mod command;
mod config;
mod error;
mod session;
