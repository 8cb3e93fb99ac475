use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdkError {
    #[error("State error: {0}")]
    StateError(#[from] grouping_state::StateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{operation} failed: {message}")]
    Command { operation: String, message: String },

    #[error("No active player")]
    NoActivePlayer,

    #[error("Predefined group not found: {0}")]
    PredefinedGroupNotFound(String),

    #[error("No grouping changes pending")]
    NothingToApply,

    #[error("A grouping change is already being applied")]
    ApplyInProgress,
}

impl SdkError {
    /// Error reported by a command service call
    pub fn command(operation: impl Into<String>, message: impl Into<String>) -> Self {
        SdkError::Command {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SdkError {
    fn from(err: serde_json::Error) -> Self {
        SdkError::Config(err.to_string())
    }
}
