//! Group type

use serde::Serialize;

use super::{EntityView, PlayerId};

/// A resolved speaker cluster with exactly one main player
///
/// `members` always contains the main player first. A group with a single
/// member is an ungrouped player. Groups are rebuilt on every state refresh
/// and never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    members: Vec<EntityView>,
}

impl Group {
    /// Create a group of one
    pub fn standalone(player: EntityView) -> Self {
        Self {
            members: vec![player],
        }
    }

    /// Create a group from its main player and the remaining members
    pub(crate) fn with_members(main: EntityView, others: Vec<EntityView>) -> Self {
        let mut members = Vec::with_capacity(others.len() + 1);
        members.push(main);
        members.extend(others);
        Self { members }
    }

    /// Get the main player
    pub fn main(&self) -> &EntityView {
        &self.members[0]
    }

    pub fn main_id(&self) -> &PlayerId {
        &self.main().id
    }

    /// Display name of the group, taken from the main player
    pub fn name(&self) -> &str {
        &self.main().name
    }

    /// Get all group members, main player first
    pub fn members(&self) -> &[EntityView] {
        &self.members
    }

    pub fn member_ids(&self) -> impl Iterator<Item = &PlayerId> {
        self.members.iter().map(|m| &m.id)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Check if this is a standalone player (group of 1)
    pub fn is_standalone(&self) -> bool {
        self.members.len() == 1
    }

    /// Check if a player is in this group, main player included
    pub fn has_member(&self, player_id: &PlayerId) -> bool {
        self.members.iter().any(|m| &m.id == player_id)
    }

    pub fn get_member(&self, player_id: &PlayerId) -> Option<&EntityView> {
        self.members.iter().find(|m| &m.id == player_id)
    }

    /// Playback state of a group follows its main player
    pub fn is_playing(&self) -> bool {
        self.main().is_playing()
    }
}
