//! Playback state enumeration

use serde::{Deserialize, Serialize};

/// Raw state value reserved for entities that cannot currently be reached
pub const UNAVAILABLE: &str = "unavailable";

/// Power/playback state of a media player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Powered on, nothing loaded
    Idle,
    /// Currently playing audio
    Playing,
    /// Loading audio before playback starts
    Buffering,
    /// Playback is paused
    Paused,
    /// Powered off
    Off,
    /// Entity cannot be reached
    Unavailable,
    /// Any other state reported by the source
    Other,
}

impl PlaybackState {
    /// Parse from the raw state string of an entity
    ///
    /// Matching is case-insensitive. "on" and "standby" map to `Idle`;
    /// anything unknown maps to `Other`.
    pub fn from_state(state: &str) -> Self {
        match state.to_ascii_lowercase().as_str() {
            "idle" | "on" | "standby" => PlaybackState::Idle,
            "playing" => PlaybackState::Playing,
            "buffering" => PlaybackState::Buffering,
            "paused" => PlaybackState::Paused,
            "off" => PlaybackState::Off,
            UNAVAILABLE => PlaybackState::Unavailable,
            _ => PlaybackState::Other,
        }
    }

    /// Playing, or about to be
    pub fn is_active_playback(&self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Buffering)
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        PlaybackState::Idle
    }
}
