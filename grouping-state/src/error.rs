//! Error types for grouping-state

use crate::model::PlayerId;

/// Result type for grouping-state operations
pub type Result<T> = std::result::Result<T, StateError>;

/// Errors that can occur while resolving or diffing groups
///
/// None of these abort a whole resolution pass: per-entity errors are
/// collected into [`crate::topology::ResolutionFailure`] entries.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StateError {
    /// A state record could not be turned into an entity view
    #[error("Malformed record for {player_id}: {reason}")]
    MalformedRecord { player_id: PlayerId, reason: String },

    /// Member lists of several players contradict each other
    #[error("Inconsistent group membership for {player_id}: {reason}")]
    InconsistentMembership { player_id: PlayerId, reason: String },

    /// Error parsing raw input
    #[error("Parse error: {0}")]
    Parse(String),

    /// A grouping request would leave no player selected
    #[error("Grouping selection is empty")]
    EmptySelection,

    /// Player not found
    #[error("Player not found: {0}")]
    PlayerNotFound(PlayerId),
}

impl From<serde_json::Error> for StateError {
    fn from(err: serde_json::Error) -> Self {
        StateError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = StateError::MalformedRecord {
            player_id: PlayerId::new("media_player.den"),
            reason: "group_members is not a list".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed record for media_player.den: group_members is not a list"
        );
        assert_eq!(StateError::EmptySelection.to_string(), "Grouping selection is empty");
    }

    #[test]
    fn test_from_serde_json() {
        let err: StateError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, StateError::Parse(_)));
    }
}
