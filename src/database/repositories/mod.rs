//! Repository implementations for data access

pub mod group;
pub mod music;
pub mod playlist;
pub mod rating;
pub mod user;

pub use group::GroupRepository;
pub use music::MusicRepository;
pub use playlist::PlaylistRepository;
pub use rating::RatingRepository;
pub use user::UserRepository;
