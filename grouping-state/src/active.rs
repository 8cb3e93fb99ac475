//! Active player selection
//!
//! Picks the one group the controlling UI works on. Inputs are explicit:
//! the resolved groups plus a [`SelectionContext`] carrying every override
//! signal. Selection is a pure function of those inputs.

use tracing::debug;

use crate::model::{Group, PlayerId};

/// Status value meaning the automation system is disengaged
pub const AUTOMATION_OFF: &str = "OFF";

/// Speaker value meaning no speaker is designated
pub const AUTOMATION_NO_SPEAKER: &str = "None";

/// Raw signals published by a whole-home audio automation system
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutomationSignals {
    pub status: Option<String>,
    pub primary_speaker: Option<String>,
    pub preferred_speaker: Option<String>,
}

impl AutomationSignals {
    /// Status is present and not the "off" sentinel
    pub fn is_engaged(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|status| !status.is_empty() && !status.eq_ignore_ascii_case(AUTOMATION_OFF))
    }

    /// The speaker the automation system wants in front
    ///
    /// Falls back to the preferred speaker when the primary one is missing
    /// or set to the "none" sentinel.
    pub fn speaker(&self) -> Option<PlayerId> {
        designated(self.primary_speaker.as_deref())
            .or_else(|| designated(self.preferred_speaker.as_deref()))
            .map(PlayerId::from)
    }
}

fn designated(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case(AUTOMATION_NO_SPEAKER))
}

/// Everything that can influence which group is active
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionContext {
    /// Id explicitly asked for by the caller
    pub requested_id: Option<PlayerId>,
    /// Id from static configuration
    pub configured_id: Option<PlayerId>,
    /// Current navigation location; the text after its last `#` names a player
    pub location: Option<String>,
    pub automation: Option<AutomationSignals>,
}

impl SelectionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_requested(mut self, id: impl Into<PlayerId>) -> Self {
        self.requested_id = Some(id.into());
        self
    }

    pub fn with_configured(mut self, id: impl Into<PlayerId>) -> Self {
        self.configured_id = Some(id.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_automation(mut self, signals: AutomationSignals) -> Self {
        self.automation = Some(signals);
        self
    }

    /// First non-empty of requested id, configured id and location fragment
    pub fn target_id(&self) -> Option<PlayerId> {
        let non_empty = |id: &&PlayerId| !id.as_str().is_empty();
        self.requested_id
            .as_ref()
            .filter(non_empty)
            .or_else(|| self.configured_id.as_ref().filter(non_empty))
            .cloned()
            .or_else(|| self.location.as_deref().and_then(fragment_id))
    }
}

/// Player id embedded in a location such as `https://host/dashboard#media_player.den`
pub fn fragment_id(location: &str) -> Option<PlayerId> {
    location
        .rsplit_once('#')
        .map(|(_, fragment)| fragment)
        .filter(|fragment| !fragment.is_empty())
        .map(PlayerId::from)
}

/// Chooses the active group
pub struct ActivePlayerSelector;

impl ActivePlayerSelector {
    /// Select the active group; `None` only when there are no groups
    ///
    /// Priority: engaged automation speaker, then the target id, then the
    /// first playing group, then the first group.
    pub fn select<'a>(groups: &'a [Group], ctx: &SelectionContext) -> Option<&'a Group> {
        if let Some(group) = Self::automation_group(groups, ctx) {
            debug!(main_player = %group.main_id(), "Active group chosen by automation");
            return Some(group);
        }

        if let Some(target) = ctx.target_id() {
            if let Some(group) = find_group(groups, &target) {
                return Some(group);
            }
            debug!(player_id = %target, "Requested player is not in any group");
        }

        groups
            .iter()
            .find(|group| group.is_playing())
            .or_else(|| groups.first())
    }

    fn automation_group<'a>(groups: &'a [Group], ctx: &SelectionContext) -> Option<&'a Group> {
        let signals = ctx.automation.as_ref().filter(|s| s.is_engaged())?;
        let speaker = signals.speaker()?;
        find_group(groups, &speaker)
    }
}

fn find_group<'a>(groups: &'a [Group], player_id: &PlayerId) -> Option<&'a Group> {
    groups.iter().find(|group| group.has_member(player_id))
}
