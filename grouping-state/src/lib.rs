//! Speaker grouping state
//!
//! Pure, synchronous engine behind a multi-room speaker grouping UI.
//!
//! # Architecture
//!
//! ```text
//! StateSnapshot → EntityView → TopologyResolver → ActivePlayerSelector
//!                                               → GroupingItem / PendingEdit → GroupingDiffEngine
//!               PredefinedGroupResolver ───────────────────┘
//! ```
//!
//! Every stage is a plain function of its inputs. A state refresh produces a
//! new [`StateSnapshot`]; everything downstream is rebuilt from it.
//!
//! # Quick Start
//!
//! ```rust
//! use grouping_state::{
//!     grouping_items, ActivePlayerSelector, GroupingDiffEngine, PendingEdit, PlayerId,
//!     SelectionContext, StateRecord, StateSnapshot, TopologyResolver,
//! };
//!
//! let snapshot = StateSnapshot::new()
//!     .with("media_player.kitchen", StateRecord::new("playing"))
//!     .with("media_player.den", StateRecord::new("idle"));
//!
//! let topology = TopologyResolver::resolve_snapshot(&snapshot);
//! let active = ActivePlayerSelector::select(topology.groups(), &SelectionContext::new())
//!     .expect("at least one group");
//!
//! let mut edit = PendingEdit::new();
//! edit.toggle_unchecked(&PlayerId::new("media_player.den"));
//!
//! let players = topology.all_players();
//! let items = grouping_items(&players, active, &edit);
//! let joined = grouping_state::joined_players(&players, active);
//! let changes = GroupingDiffEngine::diff(&items, &joined, active.main_id())?;
//!
//! assert_eq!(changes.join, vec![PlayerId::new("media_player.den")]);
//! # Ok::<(), grouping_state::StateError>(())
//! ```

// Core modules
pub mod model;
pub mod snapshot;
pub mod topology;

// Selection and configuration expansion
pub mod active;
pub mod predefined;

// Editing and diffing
pub mod diff;
pub mod grouping;

// Error types
pub mod error;

// Logging infrastructure
pub mod logging;

#[cfg(test)]
mod test_support;

// ============================================================================
// Re-exports
// ============================================================================

pub use model::{EntityView, Group, PlaybackState, PlayerId};
pub use snapshot::{StateRecord, StateSnapshot};
pub use topology::{ResolutionFailure, Topology, TopologyResolver};

pub use active::{fragment_id, ActivePlayerSelector, AutomationSignals, SelectionContext};
pub use predefined::{
    ConfigPredefinedGroupPlayer, PredefinedGroup, PredefinedGroupConfig, PredefinedGroupPlayer,
    PredefinedGroupResolver,
};

pub use diff::{GroupingChanges, GroupingDiffEngine};
pub use grouping::{grouping_items, joined_players, not_joined_players, GroupingItem, PendingEdit};

pub use error::{Result, StateError};

pub use logging::{init_logging, init_logging_from_env, init_silent, LoggingError, LoggingMode};

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::active::{ActivePlayerSelector, SelectionContext};
    pub use crate::diff::{GroupingChanges, GroupingDiffEngine};
    pub use crate::grouping::{grouping_items, GroupingItem, PendingEdit};
    pub use crate::model::{EntityView, Group, PlaybackState, PlayerId};
    pub use crate::predefined::{PredefinedGroup, PredefinedGroupConfig, PredefinedGroupResolver};
    pub use crate::snapshot::{StateRecord, StateSnapshot};
    pub use crate::topology::{Topology, TopologyResolver};
}
