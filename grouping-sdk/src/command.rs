//! Command boundary
//!
//! The session never talks to speakers directly. Every change it decides on
//! becomes an [`Operation`], and operations are handed to a
//! [`CommandService`] one at a time.

use std::fmt;

use async_trait::async_trait;
use grouping_state::{PlayerId, PredefinedGroup};

use crate::SdkError;

/// Issues grouping commands to the speaker system
///
/// Implementations wrap whatever transport reaches the speakers. Calls are
/// awaited in order, so an implementation may assume a `join` has returned
/// before the following `unjoin` is issued.
#[async_trait]
pub trait CommandService: Send + Sync {
    /// Add `members` to the group led by `main`
    async fn join(&self, main: &PlayerId, members: &[PlayerId]) -> Result<(), SdkError>;

    /// Remove `members` from whatever group they are in
    async fn unjoin(&self, members: &[PlayerId]) -> Result<(), SdkError>;

    /// Apply the volume, unmute and media settings of a predefined group
    async fn set_volume_and_media(&self, group: &PredefinedGroup) -> Result<(), SdkError>;

    /// Turn an automation room switch on or off
    async fn set_switch(&self, entity_id: &str, on: bool) -> Result<(), SdkError>;
}

/// A single command call
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Join {
        main: PlayerId,
        members: Vec<PlayerId>,
    },
    Unjoin {
        members: Vec<PlayerId>,
    },
    SetVolumeAndMedia(PredefinedGroup),
    SetSwitch {
        entity_id: String,
        on: bool,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Join { .. } => "join",
            Operation::Unjoin { .. } => "unjoin",
            Operation::SetVolumeAndMedia(_) => "set_volume_and_media",
            Operation::SetSwitch { .. } => "set_switch",
        }
    }

    /// Issue this operation through a command service
    pub async fn run(&self, service: &dyn CommandService) -> Result<(), SdkError> {
        match self {
            Operation::Join { main, members } => service.join(main, members).await,
            Operation::Unjoin { members } => service.unjoin(members).await,
            Operation::SetVolumeAndMedia(group) => service.set_volume_and_media(group).await,
            Operation::SetSwitch { entity_id, on } => service.set_switch(entity_id, *on).await,
        }
    }
}

fn join_ids(ids: &[PlayerId]) -> String {
    ids.iter().map(PlayerId::as_str).collect::<Vec<_>>().join(", ")
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Join { main, members } => {
                write!(f, "join [{}] to {}", join_ids(members), main)
            }
            Operation::Unjoin { members } => write!(f, "unjoin [{}]", join_ids(members)),
            Operation::SetVolumeAndMedia(group) => {
                write!(f, "set volume and media for {}", group.name)
            }
            Operation::SetSwitch { entity_id, on } => {
                write!(f, "turn {} {}", entity_id, if *on { "on" } else { "off" })
            }
        }
    }
}
