//! State records as delivered by the external state source
//!
//! The source publishes a mapping from entity id to `{state, attributes}`.
//! Only the fields the grouping engine needs are interpreted here; every
//! other attribute is carried along untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::error::{Result, StateError};
use crate::model::{EntityView, PlaybackState, PlayerId};
use crate::topology::ResolutionFailure;

const GROUP_MEMBERS: &str = "group_members";
const FRIENDLY_NAME: &str = "friendly_name";

/// Raw state of one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    pub state: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl StateRecord {
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Shorthand for setting the `group_members` attribute
    pub fn with_group_members<I, S>(self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let members: Vec<Value> = members
            .into_iter()
            .map(|m| Value::String(m.into()))
            .collect();
        self.with_attribute(GROUP_MEMBERS, members)
    }

    pub fn is_unavailable(&self) -> bool {
        PlaybackState::from_state(&self.state) == PlaybackState::Unavailable
    }

    /// Convert into the engine's view of the player
    ///
    /// Fails when `group_members` is present but is not a list of strings,
    /// or when `friendly_name` is present but is not a string.
    pub fn to_entity_view(&self, id: &PlayerId) -> Result<EntityView> {
        let members = match self.attributes.get(GROUP_MEMBERS) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(values)) => values
                .iter()
                .map(|value| {
                    value
                        .as_str()
                        .map(PlayerId::from)
                        .ok_or_else(|| malformed(id, format!("non-string group member {}", value)))
                })
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(malformed(id, format!("group_members is not a list: {}", other)));
            }
        };

        let name = match self.attributes.get(FRIENDLY_NAME) {
            None | Some(Value::Null) => id.object_id().to_string(),
            Some(Value::String(name)) => name.clone(),
            Some(other) => {
                return Err(malformed(id, format!("friendly_name is not a string: {}", other)));
            }
        };

        let state = PlaybackState::from_state(&self.state);
        Ok(EntityView::new(id.clone(), name)
            .with_state(state)
            .with_members(members))
    }
}

fn malformed(id: &PlayerId, reason: String) -> StateError {
    StateError::MalformedRecord {
        player_id: id.clone(),
        reason,
    }
}

/// One full refresh of the state source
///
/// A snapshot is replaced wholesale on every refresh; nothing downstream
/// keeps references into an older one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSnapshot {
    records: BTreeMap<PlayerId, StateRecord>,
}

impl StateSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `{entity_id: {state, attributes}}` JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn insert(&mut self, id: impl Into<PlayerId>, record: StateRecord) {
        self.records.insert(id.into(), record);
    }

    pub fn with(mut self, id: impl Into<PlayerId>, record: StateRecord) -> Self {
        self.insert(id, record);
        self
    }

    pub fn get(&self, id: &str) -> Option<&StateRecord> {
        self.records.get(id)
    }

    /// Raw state string of any entity (sensors and switches included)
    pub fn state_of(&self, id: &str) -> Option<&str> {
        self.get(id).map(|record| record.state.as_str())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Entity views for every `media_player.*` record, ordered by id
    ///
    /// A malformed record is reported and skipped; it never prevents the
    /// other records from converting.
    pub fn media_players(&self) -> (Vec<EntityView>, Vec<ResolutionFailure>) {
        let mut players = Vec::new();
        let mut failures = Vec::new();

        for (id, record) in self.records.iter().filter(|(id, _)| id.is_media_player()) {
            match record.to_entity_view(id) {
                Ok(view) => players.push(view),
                Err(err) => {
                    error!(player_id = %id, error = %err, "Failed to read player state");
                    failures.push(ResolutionFailure::new(id.clone(), err));
                }
            }
        }

        debug!(
            players = players.len(),
            failures = failures.len(),
            "Converted state snapshot"
        );
        (players, failures)
    }
}
