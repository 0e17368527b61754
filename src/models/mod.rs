//! Data models
//!
//! Database-backed entities shared across repositories and handlers.

pub mod group;
pub mod music;
pub mod playlist;
pub mod rating;
pub mod user;

pub use group::Group;
pub use music::{Music, MusicKind, NewMusic};
pub use playlist::{PlaylistBinding, PlaylistHandle};
pub use rating::{rating_stats, Rating};
pub use user::{User, UserStatistics};
