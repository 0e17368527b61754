//! TuneCircle Telegram Bot
//!
//! A social music-sharing bot: users link a music-service account, form
//! small groups, share tracks and albums with commentary, rate each other's
//! shares, browse the history, and keep a shared remote playlist per group
//! reconciled against the group's music log.

#![allow(non_snake_case)]

pub mod config;
pub mod database;
pub mod events;
pub mod handlers;
pub mod models;
pub mod provider;
pub mod render;
pub mod state;
pub mod sync;
pub mod utils;

pub use config::Settings;
pub use database::DatabaseService;
pub use events::CallbackEvent;
pub use state::{ConversationContext, DialogState, StateStorage};
pub use sync::SyncEngine;
pub use utils::errors::{ProviderError, Result, TuneCircleError};
