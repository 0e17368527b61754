//! Playlist synchronization

pub mod engine;
pub mod scheduler;
pub mod store;

pub use engine::{SyncEngine, SyncOutcome, SweepReport};
pub use scheduler::start_sweep_task;
pub use store::SyncStore;
