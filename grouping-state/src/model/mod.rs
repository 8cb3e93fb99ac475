//! Model types for grouping-state

mod entity;
mod group;
mod playback_state;
mod player_id;

pub use entity::EntityView;
pub use group::Group;
pub use playback_state::PlaybackState;
pub use player_id::PlayerId;
