//! Predefined groups
//!
//! Configuration-level group templates, expanded into concrete players.
//! Expansion only depends on the configuration and the known players, not on
//! the live grouping.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::{EntityView, PlayerId};

/// One configured entry: a bare id or an id with a volume override
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigPredefinedGroupPlayer {
    Id(PlayerId),
    Player {
        player: PlayerId,
        #[serde(default)]
        volume: Option<u8>,
    },
}

impl ConfigPredefinedGroupPlayer {
    pub fn player_id(&self) -> &PlayerId {
        match self {
            ConfigPredefinedGroupPlayer::Id(id) => id,
            ConfigPredefinedGroupPlayer::Player { player, .. } => player,
        }
    }

    pub fn volume(&self) -> Option<u8> {
        match self {
            ConfigPredefinedGroupPlayer::Id(_) => None,
            ConfigPredefinedGroupPlayer::Player { volume, .. } => *volume,
        }
    }
}

impl From<&str> for ConfigPredefinedGroupPlayer {
    fn from(id: &str) -> Self {
        ConfigPredefinedGroupPlayer::Id(PlayerId::new(id))
    }
}

/// A predefined group as written in configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredefinedGroupConfig {
    pub name: String,
    #[serde(default)]
    pub entities: Vec<ConfigPredefinedGroupPlayer>,
    /// Treat `entities` as the players to leave out
    #[serde(default)]
    pub exclude_items_in_entities_list: bool,
    /// Media to start once the group is formed
    #[serde(default)]
    pub media: Option<String>,
    /// Volume applied to members without their own override
    #[serde(default)]
    pub volume: Option<u8>,
    #[serde(default)]
    pub unmute_when_grouped: bool,
}

impl PredefinedGroupConfig {
    pub fn new<I, P>(name: impl Into<String>, entities: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<ConfigPredefinedGroupPlayer>,
    {
        Self {
            name: name.into(),
            entities: entities.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn excluding(mut self) -> Self {
        self.exclude_items_in_entities_list = true;
        self
    }
}

/// A resolved member of a predefined group
#[derive(Debug, Clone, PartialEq)]
pub struct PredefinedGroupPlayer {
    pub player: EntityView,
    pub volume: Option<u8>,
}

/// A predefined group resolved against the known players; never empty
#[derive(Debug, Clone, PartialEq)]
pub struct PredefinedGroup {
    pub name: String,
    pub entities: Vec<PredefinedGroupPlayer>,
    pub media: Option<String>,
    pub volume: Option<u8>,
    pub unmute_when_grouped: bool,
}

impl PredefinedGroup {
    pub fn contains(&self, player_id: &PlayerId) -> bool {
        self.entities.iter().any(|e| &e.player.id == player_id)
    }

    pub fn player_ids(&self) -> impl Iterator<Item = &PlayerId> {
        self.entities.iter().map(|e| &e.player.id)
    }

    /// Volume for one member: its own override, else the group volume
    pub fn volume_for(&self, player_id: &PlayerId) -> Option<u8> {
        self.entities
            .iter()
            .find(|e| &e.player.id == player_id)
            .and_then(|e| e.volume.or(self.volume))
    }
}

/// Expands predefined group configurations
pub struct PredefinedGroupResolver;

impl PredefinedGroupResolver {
    /// Resolve every configured group, dropping the ones left empty
    ///
    /// Output order matches configuration order.
    pub fn resolve(
        configs: &[PredefinedGroupConfig],
        all_players: &[EntityView],
    ) -> Vec<PredefinedGroup> {
        configs
            .iter()
            .filter_map(|config| Self::resolve_one(config, all_players))
            .collect()
    }

    pub fn resolve_one(
        config: &PredefinedGroupConfig,
        all_players: &[EntityView],
    ) -> Option<PredefinedGroup> {
        let entries = Self::entries(config, all_players);

        let entities: Vec<PredefinedGroupPlayer> = entries
            .into_iter()
            .filter_map(|(player_id, volume)| {
                let Some(player) = all_players.iter().find(|p| p.id == player_id) else {
                    debug!(group = %config.name, player_id = %player_id, "Unknown player in predefined group");
                    return None;
                };
                if !player.available {
                    warn!(group = %config.name, player_id = %player_id, "Player is unavailable");
                    return None;
                }
                Some(PredefinedGroupPlayer {
                    player: player.clone(),
                    volume,
                })
            })
            .collect();

        if entities.is_empty() {
            debug!(group = %config.name, "Predefined group has no available players");
            return None;
        }

        Some(PredefinedGroup {
            name: config.name.clone(),
            entities,
            media: config.media.clone(),
            volume: config.volume,
            unmute_when_grouped: config.unmute_when_grouped,
        })
    }

    /// Normalized `(id, volume)` entries, exclusions already inverted
    fn entries(
        config: &PredefinedGroupConfig,
        all_players: &[EntityView],
    ) -> Vec<(PlayerId, Option<u8>)> {
        if config.exclude_items_in_entities_list {
            all_players
                .iter()
                .filter(|p| !config.entities.iter().any(|e| e.player_id() == &p.id))
                .map(|p| (p.id.clone(), None))
                .collect()
        } else {
            config
                .entities
                .iter()
                .map(|e| (e.player_id().clone(), e.volume()))
                .collect()
        }
    }
}
