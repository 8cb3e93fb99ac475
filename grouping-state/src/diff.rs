//! Grouping diff
//!
//! Computes the join/unjoin operations that take the active group from its
//! current membership to the membership selected in a grouping edit.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::error::{Result, StateError};
use crate::grouping::GroupingItem;
use crate::model::PlayerId;

/// Operations needed to reach the desired group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupingChanges {
    /// Players to remove, in current-membership order
    pub un_join: Vec<PlayerId>,
    /// Players to add, in item order
    pub join: Vec<PlayerId>,
    /// Main player once the changes are applied
    pub new_main_player: PlayerId,
}

impl GroupingChanges {
    /// No join or unjoin needed
    pub fn is_noop(&self) -> bool {
        self.un_join.is_empty() && self.join.is_empty()
    }

    pub fn main_changed(&self, previous: &PlayerId) -> bool {
        &self.new_main_player != previous
    }
}

/// Diffs a grouping edit against the live membership
pub struct GroupingDiffEngine;

impl GroupingDiffEngine {
    /// Compute the changes for a set of grouping items
    ///
    /// The active player is never unjoined. Deselecting it hands the main
    /// role to the first selected item instead. An empty selection is
    /// rejected with [`StateError::EmptySelection`].
    pub fn diff(
        items: &[GroupingItem],
        currently_joined: &[PlayerId],
        active_player_id: &PlayerId,
    ) -> Result<GroupingChanges> {
        let mut seen = HashSet::new();
        let desired: Vec<&PlayerId> = items
            .iter()
            .filter(|item| item.is_selected)
            .map(GroupingItem::id)
            .filter(|id| seen.insert(*id))
            .collect();

        let Some(first_selected) = desired.first() else {
            return Err(StateError::EmptySelection);
        };

        let joined: HashSet<&PlayerId> = currently_joined.iter().collect();
        let desired_set: HashSet<&PlayerId> = desired.iter().copied().collect();

        let join: Vec<PlayerId> = desired
            .iter()
            .filter(|id| !joined.contains(*id))
            .map(|id| (*id).clone())
            .collect();

        let mut removed = HashSet::new();
        let un_join: Vec<PlayerId> = currently_joined
            .iter()
            .filter(|id| {
                !desired_set.contains(id) && *id != active_player_id && removed.insert(*id)
            })
            .cloned()
            .collect();

        let new_main_player = if desired_set.contains(active_player_id) {
            active_player_id.clone()
        } else {
            (*first_selected).clone()
        };

        debug!(
            join = join.len(),
            un_join = un_join.len(),
            new_main_player = %new_main_player,
            "Computed grouping changes"
        );

        Ok(GroupingChanges {
            un_join,
            join,
            new_main_player,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityView, Group};
    use crate::topology::TopologyResolver;
    use rstest::rstest;

    fn active_group() -> Group {
        TopologyResolver::resolve(&[
            EntityView::new("p1", "P1").with_members(["p1", "p2"]),
            EntityView::new("p2", "P2").with_members(["p1", "p2"]),
        ])
        .groups()[0]
        .clone()
    }

    /// Items for p1..p4 against the p1+p2 group with the given selection
    fn items(selected: &[&str]) -> Vec<GroupingItem> {
        let active = active_group();
        ["p1", "p2", "p3", "p4"]
            .iter()
            .map(|id| {
                let player = EntityView::new(*id, id.to_uppercase());
                let joined = active.has_member(&player.id);
                GroupingItem::new(player, &active, joined != selected.contains(id))
            })
            .collect()
    }

    fn ids(ids: &[&str]) -> Vec<PlayerId> {
        ids.iter().map(|id| PlayerId::new(*id)).collect()
    }

    #[rstest]
    #[case(&["p1", "p2"], &[], &[], "p1")]
    #[case(&["p1", "p2", "p3"], &["p3"], &[], "p1")]
    #[case(&["p1"], &[], &["p2"], "p1")]
    #[case(&["p2"], &[], &[], "p2")]
    #[case(&["p3", "p4"], &["p3", "p4"], &["p2"], "p3")]
    #[case(&["p2", "p4"], &["p4"], &[], "p2")]
    fn test_diff_cases(
        #[case] selected: &[&str],
        #[case] join: &[&str],
        #[case] un_join: &[&str],
        #[case] new_main: &str,
    ) {
        let changes =
            GroupingDiffEngine::diff(&items(selected), &ids(&["p1", "p2"]), &PlayerId::new("p1"))
                .unwrap();

        assert_eq!(changes.join, ids(join));
        assert_eq!(changes.un_join, ids(un_join));
        assert_eq!(changes.new_main_player, new_main);
    }

    #[test]
    fn test_deselecting_main_hands_over_without_unjoin() {
        let changes =
            GroupingDiffEngine::diff(&items(&["p2"]), &ids(&["p1", "p2"]), &PlayerId::new("p1"))
                .unwrap();

        assert!(changes.un_join.is_empty());
        assert!(changes.join.is_empty());
        assert!(changes.main_changed(&PlayerId::new("p1")));
    }

    #[test]
    fn test_empty_selection_is_rejected() {
        let result = GroupingDiffEngine::diff(&items(&[]), &ids(&["p1", "p2"]), &PlayerId::new("p1"));
        assert_eq!(result, Err(StateError::EmptySelection));
    }

    #[test]
    fn test_applying_changes_reaches_fixed_point() {
        let current = ids(&["p1", "p2"]);
        let selection = items(&["p3", "p2"]);
        let first = GroupingDiffEngine::diff(&selection, &current, &PlayerId::new("p1")).unwrap();

        let after: Vec<PlayerId> = current
            .iter()
            .filter(|id| !first.un_join.contains(id))
            .chain(first.join.iter())
            .cloned()
            .collect();
        let second = GroupingDiffEngine::diff(&selection, &after, &PlayerId::new("p1")).unwrap();

        assert!(second.is_noop());
        assert_eq!(second.new_main_player, first.new_main_player);
    }
}
