//! Grouping session
//!
//! A [`GroupingSession`] owns one edit cycle against the live speaker state:
//! it resolves the topology, picks the active group, collects toggles and
//! turns a committed edit into an ordered list of [`Operation`]s.
//!
//! ```text
//! Idle ──toggle/select──▶ Editing ──begin_apply──▶ Applying ──finish_apply──▶ Idle
//!                           │
//!                           └──cancel──▶ Idle
//! ```

use grouping_state::{
    grouping_items, joined_players, not_joined_players, ActivePlayerSelector, EntityView,
    Group, GroupingChanges, GroupingDiffEngine, GroupingItem, PendingEdit, PlayerId,
    PredefinedGroup, PredefinedGroupResolver, ResolutionFailure, SelectionContext,
    StateError, StateSnapshot, Topology, TopologyResolver,
};
use tracing::{debug, info, warn};

use crate::command::{CommandService, Operation};
use crate::config::GroupingConfig;
use crate::SdkError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No edit pending
    Idle,
    /// Toggles collected but not committed
    Editing,
    /// A committed edit is being issued
    Applying,
}

/// A command call that returned an error
#[derive(Debug)]
pub struct CommandFailure {
    pub operation: Operation,
    pub error: SdkError,
}

/// Outcome of one applied edit
#[derive(Debug)]
pub struct ApplyReport {
    pub changes: GroupingChanges,
    /// Operations that succeeded, in issue order
    pub completed: Vec<Operation>,
    pub failures: Vec<CommandFailure>,
    /// Player that should become the active player
    pub active_player_changed: Option<PlayerId>,
}

impl ApplyReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Everything decided for one committed edit, before any command is issued
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyPlan {
    pub changes: GroupingChanges,
    pub operations: Vec<Operation>,
    pub notify: Option<PlayerId>,
}

impl ApplyPlan {
    /// Issue every operation in order
    ///
    /// A failing call is recorded and the remaining calls are still issued.
    pub async fn execute(&self, service: &dyn CommandService) -> ApplyReport {
        let mut completed = Vec::with_capacity(self.operations.len());
        let mut failures = Vec::new();

        for operation in &self.operations {
            debug!(operation = %operation, "Issuing command");
            match operation.run(service).await {
                Ok(()) => completed.push(operation.clone()),
                Err(error) => {
                    warn!(operation = operation.name(), error = %error, "Command failed");
                    failures.push(CommandFailure {
                        operation: operation.clone(),
                        error,
                    });
                }
            }
        }

        info!(
            completed = completed.len(),
            failed = failures.len(),
            new_main_player = %self.changes.new_main_player,
            "Applied grouping"
        );

        ApplyReport {
            changes: self.changes.clone(),
            completed,
            failures,
            active_player_changed: self.notify.clone(),
        }
    }
}

/// One grouping edit cycle over a state snapshot
#[derive(Debug)]
pub struct GroupingSession {
    config: GroupingConfig,
    snapshot: StateSnapshot,
    topology: Topology,
    failures: Vec<ResolutionFailure>,
    players: Vec<EntityView>,
    predefined_groups: Vec<PredefinedGroup>,
    requested_id: Option<PlayerId>,
    location: Option<String>,
    active_main: Option<PlayerId>,
    pending: PendingEdit,
    applying: bool,
}

impl GroupingSession {
    pub fn new(
        config: GroupingConfig,
        snapshot: StateSnapshot,
        requested_id: Option<PlayerId>,
    ) -> Self {
        let mut session = Self {
            config,
            snapshot,
            topology: Topology::default(),
            failures: Vec::new(),
            players: Vec::new(),
            predefined_groups: Vec::new(),
            requested_id,
            location: None,
            active_main: None,
            pending: PendingEdit::new(),
            applying: false,
        };
        session.rebuild();
        session
    }

    /// Use the fragment of a navigation location as a fallback player id
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self.select_active();
        self
    }

    /// Replace the snapshot and rebuild everything derived from it
    pub fn refresh(&mut self, snapshot: StateSnapshot) {
        self.snapshot = snapshot;
        self.rebuild();
    }

    /// Ask for a different active player
    pub fn set_requested(&mut self, player_id: Option<PlayerId>) {
        self.requested_id = player_id;
        self.select_active();
    }

    fn rebuild(&mut self) {
        let (mut media_players, mut failures) = self.snapshot.media_players();
        let topology = TopologyResolver::resolve(&media_players);
        failures.extend(topology.failures().iter().cloned());

        media_players.sort_by(EntityView::display_order);
        self.predefined_groups =
            PredefinedGroupResolver::resolve(&self.config.predefined_groups, &media_players);

        self.players = topology.all_players();
        self.topology = topology;
        self.failures = failures;

        let topology = &self.topology;
        self.pending.retain_known(|id| topology.player(id).is_some());

        debug!(
            groups = self.topology.groups().len(),
            predefined_groups = self.predefined_groups.len(),
            failures = self.failures.len(),
            "Rebuilt grouping session"
        );
        self.select_active();
    }

    fn selection_context(&self) -> SelectionContext {
        SelectionContext {
            requested_id: self.requested_id.clone(),
            configured_id: self.config.entity_id.clone(),
            location: self.location.clone(),
            automation: self.config.automation_signals(&self.snapshot),
        }
    }

    fn select_active(&mut self) {
        let ctx = self.selection_context();
        let main = ActivePlayerSelector::select(self.topology.groups(), &ctx)
            .map(|group| group.main_id().clone());

        if main != self.active_main {
            if !self.pending.is_empty() {
                debug!("Active group changed, discarding pending edit");
                self.pending.clear();
            }
            debug!(main_player = ?main, "Active group changed");
            self.active_main = main;
        }
    }

    pub fn config(&self) -> &GroupingConfig {
        &self.config
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Read and membership failures of the last rebuild
    pub fn failures(&self) -> &[ResolutionFailure] {
        &self.failures
    }

    pub fn predefined_groups(&self) -> &[PredefinedGroup] {
        &self.predefined_groups
    }

    pub fn active_group(&self) -> Option<&Group> {
        self.active_main
            .as_ref()
            .and_then(|id| self.topology.group_of(id))
    }

    /// Applying an edit sets room switches instead of grouping speakers
    pub fn automation_active(&self) -> bool {
        self.config.automation_active(&self.snapshot)
    }

    /// Room switches should be shown in place of grouping toggles
    pub fn automation_shown(&self) -> bool {
        self.config.automation_shown(&self.snapshot)
    }

    /// Turn the automation system on or off
    pub fn set_automation_system(&self, on: bool) -> Result<Operation, SdkError> {
        let entity_id = self
            .config
            .ags_system_switch
            .clone()
            .ok_or_else(|| SdkError::Config("no automation system switch configured".to_string()))?;
        Ok(Operation::SetSwitch { entity_id, on })
    }

    /// Turn one player's automation room switch on or off
    pub fn set_room_switch(&self, player_id: &PlayerId, on: bool) -> Result<Operation, SdkError> {
        if self.topology.player(player_id).is_none() {
            return Err(StateError::PlayerNotFound(player_id.clone()).into());
        }
        let entity_id = self
            .config
            .player_room_switch_id(player_id)
            .ok_or_else(|| SdkError::Config("no room switch prefix configured".to_string()))?;
        Ok(Operation::SetSwitch { entity_id, on })
    }

    /// Current state of a player's room switch; `false` when there is none
    pub fn room_switch_state(&self, player_id: &PlayerId) -> bool {
        self.config
            .player_room_switch_id(player_id)
            .and_then(|switch| self.snapshot.state_of(&switch).map(|state| state == "on"))
            .unwrap_or(false)
    }

    pub fn phase(&self) -> SessionPhase {
        if self.applying {
            SessionPhase::Applying
        } else if self.pending.is_empty() {
            SessionPhase::Idle
        } else {
            SessionPhase::Editing
        }
    }

    pub fn pending(&self) -> &PendingEdit {
        &self.pending
    }

    /// Every player projected against the active group and the pending edit
    pub fn items(&self) -> Vec<GroupingItem> {
        match self.active_group() {
            Some(active) => grouping_items(&self.players, active, &self.pending),
            None => Vec::new(),
        }
    }

    pub fn joined_players(&self) -> Vec<PlayerId> {
        self.active_group()
            .map(|active| joined_players(&self.players, active))
            .unwrap_or_default()
    }

    pub fn not_joined_players(&self) -> Vec<PlayerId> {
        self.active_group()
            .map(|active| not_joined_players(&self.players, active))
            .unwrap_or_default()
    }

    /// Edits should be applied as soon as they are made
    pub fn should_auto_apply(&self) -> bool {
        self.config.skip_apply_button_when_grouping && self.phase() == SessionPhase::Editing
    }

    fn ensure_editable(&self) -> Result<(), SdkError> {
        if self.applying {
            return Err(SdkError::ApplyInProgress);
        }
        if self.active_main.is_none() {
            return Err(SdkError::NoActivePlayer);
        }
        Ok(())
    }

    /// Toggle one player; returns `false` when the item is disabled
    pub fn toggle(&mut self, player_id: &PlayerId) -> Result<bool, SdkError> {
        self.ensure_editable()?;
        let items = self.items();
        let item = items
            .iter()
            .find(|item| item.id() == player_id)
            .ok_or_else(|| StateError::PlayerNotFound(player_id.clone()))?;
        Ok(self.pending.toggle(item))
    }

    /// Make the selection match a predefined group
    pub fn select_predefined(&mut self, name: &str) -> Result<(), SdkError> {
        self.ensure_editable()?;
        let group = self
            .predefined_groups
            .iter()
            .find(|group| group.name == name)
            .cloned()
            .ok_or_else(|| SdkError::PredefinedGroupNotFound(name.to_string()))?;
        let items = self.items();
        self.pending.select_predefined(&group, &items);
        Ok(())
    }

    pub fn select_all(&mut self) -> Result<(), SdkError> {
        self.ensure_editable()?;
        let items = self.items();
        self.pending.select_all(&items);
        Ok(())
    }

    /// Leave only the main player selected
    pub fn deselect_all(&mut self) -> Result<(), SdkError> {
        self.ensure_editable()?;
        let items = self.items();
        self.pending.deselect_all(&items);
        Ok(())
    }

    /// Drop the pending edit without issuing anything
    pub fn cancel(&mut self) {
        if !self.applying {
            self.pending.clear();
        }
    }

    /// Decide the operations for the pending edit without committing it
    pub fn plan(&self) -> Result<ApplyPlan, SdkError> {
        if self.pending.is_empty() {
            return Err(SdkError::NothingToApply);
        }
        let active = self.active_group().ok_or(SdkError::NoActivePlayer)?;
        let active_id = active.main_id();

        let items = self.items();
        let joined = joined_players(&self.players, active);
        let changes = GroupingDiffEngine::diff(&items, &joined, active_id)?;

        let mut operations = Vec::new();
        if self.automation_active() {
            operations.extend(items.iter().map(|item| Operation::SetSwitch {
                entity_id: self.config.room_switch_id(item.name()),
                on: item.is_selected,
            }));
        } else {
            if !changes.join.is_empty() {
                operations.push(Operation::Join {
                    main: changes.new_main_player.clone(),
                    members: changes.join.clone(),
                });
            }
            if !changes.un_join.is_empty() {
                operations.push(Operation::Unjoin {
                    members: changes.un_join.clone(),
                });
            }
        }
        if let Some(group) = self.pending.selected_predefined() {
            operations.push(Operation::SetVolumeAndMedia(group.clone()));
        }

        let notify = self.notify_target(&changes, active_id);

        Ok(ApplyPlan {
            changes,
            operations,
            notify,
        })
    }

    fn notify_target(&self, changes: &GroupingChanges, active_id: &PlayerId) -> Option<PlayerId> {
        if !self.config.dont_switch_player_when_grouping {
            return changes
                .main_changed(active_id)
                .then(|| changes.new_main_player.clone());
        }
        self.config
            .entity_id
            .as_ref()
            .filter(|entity_id| changes.un_join.contains(entity_id))
            .cloned()
    }

    /// Commit the pending edit and enter [`SessionPhase::Applying`]
    ///
    /// The pending edit is consumed. On error it is left untouched.
    pub fn begin_apply(&mut self) -> Result<ApplyPlan, SdkError> {
        if self.applying {
            return Err(SdkError::ApplyInProgress);
        }
        let plan = self.plan()?;
        self.pending.take();
        self.applying = true;
        Ok(plan)
    }

    /// Leave [`SessionPhase::Applying`] and follow the active player change
    pub fn finish_apply(&mut self, report: &ApplyReport) {
        self.applying = false;
        if let Some(player_id) = &report.active_player_changed {
            info!(player_id = %player_id, "Switching active player");
            self.set_requested(Some(player_id.clone()));
        }
    }

    /// Commit the pending edit and issue it through `service`
    pub async fn apply(&mut self, service: &dyn CommandService) -> Result<ApplyReport, SdkError> {
        let plan = self.begin_apply()?;
        let report = plan.execute(service).await;
        self.finish_apply(&report);
        Ok(report)
    }
}
