//! Grouping configuration
//!
//! Only the values are modelled here. Where they come from (a dashboard
//! card, a YAML file, an API) is up to the caller.

use grouping_state::{AutomationSignals, PlayerId, PredefinedGroupConfig, StateSnapshot};
use serde::{Deserialize, Serialize};

use crate::SdkError;

/// State value of an engaged switch or sensor
const ON: &str = "on";

/// Configuration consumed by a [`crate::GroupingSession`]
///
/// Field names follow the card configuration, so a JSON export of that
/// configuration deserializes directly. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupingConfig {
    /// Player to prefer as active when nothing else asks for one
    pub entity_id: Option<PlayerId>,
    pub predefined_groups: Vec<PredefinedGroupConfig>,

    /// Sensor reporting whether the automation system is engaged
    pub ags_status_sensor: Option<String>,
    /// Sensor naming the automation system's primary speaker
    pub ags_primary_speaker_sensor: Option<String>,
    /// Sensor naming the speaker used when no primary is set
    pub ags_preferred_primary_sensor: Option<String>,
    /// Switch turning the automation system on or off
    pub ags_system_switch: Option<String>,
    /// Prefix of the per-room automation switches
    pub ags_room_switch_prefix: Option<String>,

    /// Keep the active player when grouping moves the main role elsewhere
    pub dont_switch_player_when_grouping: bool,
    /// Apply every edit immediately
    pub skip_apply_button_when_grouping: bool,
}

fn is_on(snapshot: &StateSnapshot, entity_id: &str) -> bool {
    snapshot.state_of(entity_id) == Some(ON)
}

impl GroupingConfig {
    pub fn from_json(json: &str) -> Result<Self, SdkError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read the automation sensors; `None` when no status sensor is configured
    pub fn automation_signals(&self, snapshot: &StateSnapshot) -> Option<AutomationSignals> {
        let status_sensor = self.ags_status_sensor.as_deref()?;
        let read = |sensor: &Option<String>| {
            sensor
                .as_deref()
                .and_then(|id| snapshot.state_of(id))
                .map(str::to_string)
        };

        Some(AutomationSignals {
            status: snapshot.state_of(status_sensor).map(str::to_string),
            primary_speaker: read(&self.ags_primary_speaker_sensor),
            preferred_speaker: read(&self.ags_preferred_primary_sensor),
        })
    }

    /// Grouping is delegated to the automation system's room switches
    ///
    /// A configured system switch decides alone; the status sensor is only
    /// read when no switch is configured.
    pub fn automation_active(&self, snapshot: &StateSnapshot) -> bool {
        match (&self.ags_system_switch, &self.ags_status_sensor) {
            (Some(switch), _) => is_on(snapshot, switch),
            (None, Some(sensor)) => is_on(snapshot, sensor),
            (None, None) => false,
        }
    }

    /// Room switches should be shown instead of grouping toggles
    pub fn automation_shown(&self, snapshot: &StateSnapshot) -> bool {
        let on = |entity: &Option<String>| entity.as_deref().is_some_and(|id| is_on(snapshot, id));
        on(&self.ags_system_switch) || on(&self.ags_status_sensor)
    }

    /// Room switch bound to a player: prefix plus the player's object id
    ///
    /// `None` when no room switch prefix is configured.
    pub fn player_room_switch_id(&self, player_id: &PlayerId) -> Option<String> {
        self.ags_room_switch_prefix
            .as_deref()
            .filter(|prefix| !prefix.is_empty())
            .map(|prefix| format!("{}{}", prefix, player_id.object_id()))
    }

    /// Room switch for a player: prefix plus the lowercased room name with
    /// whitespace runs replaced by `_`
    pub fn room_switch_id(&self, room_name: &str) -> String {
        let mut id = self.ags_room_switch_prefix.clone().unwrap_or_default();
        let mut in_whitespace = false;
        for ch in room_name.chars() {
            if ch.is_whitespace() {
                if !in_whitespace {
                    id.push('_');
                }
                in_whitespace = true;
            } else {
                id.extend(ch.to_lowercase());
                in_whitespace = false;
            }
        }
        id
    }
}
