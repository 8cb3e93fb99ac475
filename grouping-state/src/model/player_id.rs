//! Player identity type

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Unique identifier for a media player entity
///
/// This is the entity id reported by the state source,
/// usually of the form "media_player.kitchen".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Creates a new PlayerId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Entity id without its domain prefix ("media_player.kitchen" -> "kitchen")
    pub fn object_id(&self) -> &str {
        self.0.split_once('.').map(|(_, rest)| rest).unwrap_or(&self.0)
    }

    /// Check if the id lives in the `media_player` domain
    pub fn is_media_player(&self) -> bool {
        self.0.starts_with("media_player.")
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        PlayerId::new(s)
    }
}

impl From<String> for PlayerId {
    fn from(s: String) -> Self {
        PlayerId::new(s)
    }
}

impl Borrow<str> for PlayerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for PlayerId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for PlayerId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
