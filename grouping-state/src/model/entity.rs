//! EntityView - the minimal view of a player the engine works with

use serde::{Deserialize, Serialize};

use std::cmp::Ordering;

use super::{PlaybackState, PlayerId};

/// Normalized, immutable snapshot of one media player entity
///
/// Recreated every time the state source refreshes. `members` is the raw
/// group member list reported by the player: empty or a single entry means
/// the player is not grouped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    pub id: PlayerId,
    pub name: String,
    pub available: bool,
    pub state: PlaybackState,
    pub members: Vec<PlayerId>,
}

impl EntityView {
    /// Create an available, idle, ungrouped player
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            available: true,
            state: PlaybackState::Idle,
            members: Vec::new(),
        }
    }

    /// Set the playback state; `Unavailable` also clears availability
    pub fn with_state(mut self, state: PlaybackState) -> Self {
        self.available = state != PlaybackState::Unavailable;
        self.state = state;
        self
    }

    /// Set the raw group member list
    pub fn with_members<I, P>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PlayerId>,
    {
        self.members = members.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_active_playback()
    }

    /// Presentation order: display name ignoring case, then exact name, then id
    pub fn display_order(a: &EntityView, b: &EntityView) -> Ordering {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    }

    /// Check if the raw member list names more than this player
    pub fn reports_group(&self) -> bool {
        self.members.len() > 1
    }
}
