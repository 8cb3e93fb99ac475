//! Grouping items and the pending edit
//!
//! A [`GroupingItem`] projects one player against the active group and the
//! uncommitted toggles in a [`PendingEdit`]. Items are recomputed from
//! scratch whenever any of those inputs change.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::model::{EntityView, Group, PlayerId};
use crate::predefined::PredefinedGroup;

/// One player as shown in a grouping list
#[derive(Debug, Clone, PartialEq)]
pub struct GroupingItem {
    pub player: EntityView,
    /// Main player of the active group
    pub is_main: bool,
    /// Member of the active group right now
    pub is_currently_joined: bool,
    /// Toggled in the uncommitted edit
    pub is_modified: bool,
    /// Part of the desired group once the edit is applied
    pub is_selected: bool,
    /// Sole selected item; deselecting it would leave an empty group
    pub is_disabled: bool,
}

impl GroupingItem {
    pub fn new(player: EntityView, active: &Group, is_modified: bool) -> Self {
        let is_main = &player.id == active.main_id();
        let is_currently_joined = is_main || active.has_member(&player.id);
        Self {
            player,
            is_main,
            is_currently_joined,
            is_modified,
            is_selected: is_currently_joined != is_modified,
            is_disabled: false,
        }
    }

    pub fn id(&self) -> &PlayerId {
        &self.player.id
    }

    pub fn name(&self) -> &str {
        &self.player.name
    }
}

/// Main player first, then selected items, then by name
fn item_order(a: &GroupingItem, b: &GroupingItem) -> Ordering {
    b.is_main
        .cmp(&a.is_main)
        .then_with(|| b.is_selected.cmp(&a.is_selected))
        .then_with(|| EntityView::display_order(&a.player, &b.player))
}

/// Build the grouping items for every player
pub fn grouping_items(
    all_players: &[EntityView],
    active: &Group,
    pending: &PendingEdit,
) -> Vec<GroupingItem> {
    let mut items: Vec<GroupingItem> = all_players
        .iter()
        .map(|player| GroupingItem::new(player.clone(), active, pending.is_modified(&player.id)))
        .collect();

    let mut selected = items.iter_mut().filter(|item| item.is_selected);
    if let (Some(only), None) = (selected.next(), selected.next()) {
        only.is_disabled = true;
    }

    items.sort_by(item_order);
    items
}

/// Players currently in the active group
pub fn joined_players(all_players: &[EntityView], active: &Group) -> Vec<PlayerId> {
    all_players
        .iter()
        .filter(|p| active.has_member(&p.id))
        .map(|p| p.id.clone())
        .collect()
}

/// Players outside the active group
pub fn not_joined_players(all_players: &[EntityView], active: &Group) -> Vec<PlayerId> {
    all_players
        .iter()
        .filter(|p| !active.has_member(&p.id))
        .map(|p| p.id.clone())
        .collect()
}

/// Uncommitted grouping edit
///
/// Holds the players toggled relative to the active group, or the predefined
/// group whose selection they were derived from. A manual toggle always
/// clears the predefined group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingEdit {
    modified: BTreeSet<PlayerId>,
    predefined: Option<PredefinedGroup>,
}

impl PendingEdit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_modified(&self, player_id: &PlayerId) -> bool {
        self.modified.contains(player_id)
    }

    pub fn modified(&self) -> impl Iterator<Item = &PlayerId> {
        self.modified.iter()
    }

    pub fn selected_predefined(&self) -> Option<&PredefinedGroup> {
        self.predefined.as_ref()
    }

    /// Nothing toggled and no predefined group picked
    pub fn is_empty(&self) -> bool {
        self.modified.is_empty() && self.predefined.is_none()
    }

    /// Toggle an item unless it is disabled; returns whether anything changed
    pub fn toggle(&mut self, item: &GroupingItem) -> bool {
        if item.is_disabled {
            return false;
        }
        self.toggle_unchecked(item.id());
        true
    }

    /// Toggle a player without the disabled guard
    pub fn toggle_unchecked(&mut self, player_id: &PlayerId) {
        if !self.modified.remove(player_id) {
            self.modified.insert(player_id.clone());
        }
        self.predefined = None;
    }

    /// Make the selection match a predefined group and remember the group
    pub fn select_predefined(&mut self, group: &PredefinedGroup, items: &[GroupingItem]) {
        for item in items {
            if group.contains(item.id()) != item.is_selected {
                self.toggle_unchecked(item.id());
            }
        }
        self.predefined = Some(group.clone());
    }

    /// Select every player
    pub fn select_all(&mut self, items: &[GroupingItem]) {
        for item in items.iter().filter(|item| !item.is_selected) {
            self.toggle(item);
        }
    }

    /// Keep only the main player selected
    ///
    /// The main player ends up selected, so the disabled guard of the
    /// current items does not apply.
    pub fn deselect_all(&mut self, items: &[GroupingItem]) {
        for item in items.iter().filter(|item| item.is_main != item.is_selected) {
            self.toggle_unchecked(item.id());
        }
    }

    /// Drop toggles for players that no longer exist
    pub fn retain_known(&mut self, known: impl Fn(&PlayerId) -> bool) {
        self.modified.retain(|id| known(id));
    }

    /// Discard the edit
    pub fn clear(&mut self) {
        self.modified.clear();
        self.predefined = None;
    }

    /// Take the edit for committing, leaving an empty one behind
    pub fn take(&mut self) -> PendingEdit {
        std::mem::take(self)
    }
}
