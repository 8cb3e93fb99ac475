//! Topology resolution
//!
//! Turns a flat list of player views into logical groups, one per speaker
//! cluster, each with exactly one main player. A player is a main player
//! when its member list (restricted to known, available players) is
//! trivial, or when it names itself first.
//!
//! Resolution never fails as a whole. Problems with a single player are
//! logged, recorded as a [`ResolutionFailure`], and isolated to that player.

use std::collections::{HashMap, HashSet};

use tracing::{debug, error, warn};

use crate::error::StateError;
use crate::model::{EntityView, Group, PlayerId};
use crate::snapshot::StateSnapshot;

/// A player that could not be placed normally
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionFailure {
    pub player_id: PlayerId,
    pub error: StateError,
}

impl ResolutionFailure {
    pub fn new(player_id: PlayerId, error: StateError) -> Self {
        Self { player_id, error }
    }
}

/// Resolved groups for one state refresh
#[derive(Debug, Clone, Default)]
pub struct Topology {
    groups: Vec<Group>,
    failures: Vec<ResolutionFailure>,
}

impl Topology {
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn failures(&self) -> &[ResolutionFailure] {
        &self.failures
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Find the group containing a player
    pub fn group_of(&self, player_id: &PlayerId) -> Option<&Group> {
        self.groups.iter().find(|g| g.has_member(player_id))
    }

    pub fn player(&self, player_id: &PlayerId) -> Option<&EntityView> {
        self.groups.iter().find_map(|g| g.get_member(player_id))
    }

    /// Every grouped player in presentation order (see [`EntityView::display_order`])
    pub fn all_players(&self) -> Vec<EntityView> {
        let mut players: Vec<EntityView> = self
            .groups
            .iter()
            .flat_map(|g| g.members().iter().cloned())
            .collect();
        players.sort_by(EntityView::display_order);
        players
    }
}

/// Where a single player ends up after classification
enum Placement {
    Main(Group),
    Member,
}

/// Builds [`Topology`] values from player views
pub struct TopologyResolver;

impl TopologyResolver {
    /// Resolve groups from already-converted player views
    pub fn resolve(entities: &[EntityView]) -> Topology {
        let mut seen = HashSet::new();
        let mut available: Vec<&EntityView> = Vec::with_capacity(entities.len());
        for entity in entities {
            if !entity.available {
                warn!(player_id = %entity.id, "Player is unavailable");
                continue;
            }
            if !seen.insert(&entity.id) {
                error!(player_id = %entity.id, "Duplicate player in state, keeping the first");
                continue;
            }
            available.push(entity);
        }

        let by_id: HashMap<&PlayerId, &EntityView> =
            available.iter().map(|&entity| (&entity.id, entity)).collect();

        let restricted: HashMap<&PlayerId, Vec<&PlayerId>> = available
            .iter()
            .map(|&entity| (&entity.id, restrict_members(entity, &by_id)))
            .collect();

        let claims = claim_members(&available, &restricted);

        let (groups, failures) = available.iter().fold(
            (Vec::new(), Vec::new()),
            |(mut groups, mut failures), entity| {
                match place(entity, &restricted[&entity.id], &claims, &by_id) {
                    Ok(Placement::Main(group)) => groups.push(group),
                    Ok(Placement::Member) => {}
                    Err(err) => {
                        error!(player_id = %entity.id, error = %err, "Failed to determine main player");
                        failures.push(ResolutionFailure::new(entity.id.clone(), err));
                        groups.push(Group::standalone((*entity).clone()));
                    }
                }
                (groups, failures)
            },
        );

        debug!(
            players = available.len(),
            groups = groups.len(),
            failures = failures.len(),
            "Resolved topology"
        );

        Topology { groups, failures }
    }

    /// Convert a state snapshot and resolve it
    ///
    /// Records that cannot be read are reported alongside the
    /// membership failures of the resolution itself.
    pub fn resolve_snapshot(snapshot: &StateSnapshot) -> Topology {
        let (players, mut failures) = snapshot.media_players();
        let mut topology = Self::resolve(&players);
        failures.append(&mut topology.failures);
        topology.failures = failures;
        topology
    }
}

/// Member list restricted to known players, duplicates removed
fn restrict_members<'a>(
    entity: &'a EntityView,
    by_id: &HashMap<&PlayerId, &EntityView>,
) -> Vec<&'a PlayerId> {
    let mut seen = HashSet::new();
    entity
        .members
        .iter()
        .filter(|id| by_id.contains_key(id) && seen.insert(*id))
        .collect()
}

fn is_main_player(entity: &EntityView, restricted: &[&PlayerId]) -> bool {
    restricted.len() <= 1 || restricted[0] == &entity.id
}

/// Map every claimed player to the main player owning it
///
/// Main players own themselves. Remaining members go to the first main
/// player (in input order) that lists them.
fn claim_members<'a>(
    available: &[&'a EntityView],
    restricted: &HashMap<&'a PlayerId, Vec<&'a PlayerId>>,
) -> HashMap<&'a PlayerId, &'a PlayerId> {
    let mains: Vec<&EntityView> = available
        .iter()
        .copied()
        .filter(|entity| is_main_player(entity, &restricted[&entity.id]))
        .collect();

    let mut claims: HashMap<&PlayerId, &PlayerId> =
        mains.iter().map(|&main| (&main.id, &main.id)).collect();

    for &main in &mains {
        let members = &restricted[&main.id];
        if members.len() <= 1 {
            continue;
        }
        for member in members.iter().skip(1) {
            match claims.get(member) {
                None => {
                    claims.insert(*member, &main.id);
                }
                Some(owner) if *owner == &main.id => {}
                Some(owner) => {
                    error!(
                        player_id = %member,
                        listed_by = %main.id,
                        owner = %owner,
                        "Player is listed by more than one group"
                    );
                }
            }
        }
    }

    claims
}

fn place(
    entity: &EntityView,
    restricted: &[&PlayerId],
    claims: &HashMap<&PlayerId, &PlayerId>,
    by_id: &HashMap<&PlayerId, &EntityView>,
) -> Result<Placement, StateError> {
    match claims.get(&entity.id) {
        Some(owner) if *owner == &entity.id => {
            let others: Vec<EntityView> = if restricted.len() > 1 {
                restricted
                    .iter()
                    .skip(1)
                    .filter(|id| claims.get(*id).is_some_and(|owner| *owner == &entity.id))
                    .filter_map(|id| by_id.get(*id).map(|member| (*member).clone()))
                    .collect()
            } else {
                Vec::new()
            };
            Ok(Placement::Main(Group::with_members(entity.clone(), others)))
        }
        Some(_) => Ok(Placement::Member),
        None => Err(StateError::InconsistentMembership {
            player_id: entity.id.clone(),
            reason: match restricted.first() {
                Some(main) => format!("names {} as main player, which does not list it", main),
                None => "not listed by any main player".to_string(),
            },
        }),
    }
}
