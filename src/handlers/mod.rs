//! Update handlers
//!
//! The dispatch tree splits updates into commands, free-text messages and
//! callback queries. Everything the handlers need travels in one shared
//! [`AppContext`].

pub mod callbacks;
pub mod commands;
pub mod messages;
pub mod views;

use std::sync::Arc;

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::config::Settings;
use crate::database::DatabaseService;
use crate::provider::MusicProvider;
use crate::state::{DialogState, StateStorage};
use crate::sync::SyncEngine;
use crate::utils::errors::{ProviderError, TuneCircleError};

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Shared dependencies injected into every handler
#[derive(Clone)]
pub struct AppContext {
    pub db: Arc<DatabaseService>,
    pub provider: Arc<dyn MusicProvider>,
    pub storage: Arc<StateStorage>,
    pub sync: SyncEngine,
    pub settings: Arc<Settings>,
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "TuneCircle commands")]
pub enum Command {
    #[command(description = "open the main menu")]
    Start,
    #[command(description = "show help")]
    Help,
    #[command(description = "connect your music service account")]
    Token,
    #[command(description = "show your statistics")]
    Account,
}

/// Where a failed handler leaves the dialog. A missing or expired token
/// sends the user back to the menu, a dead data layer parks the dialog in
/// Terminal, everything else keeps the current state so the user can retry.
pub(crate) fn failure_state(error: &TuneCircleError) -> Option<DialogState> {
    if !error.is_recoverable() {
        return Some(DialogState::Terminal);
    }
    match error {
        TuneCircleError::Provider(ProviderError::AuthFailed) => Some(DialogState::Menu),
        _ => None,
    }
}

/// Build the update handler tree
pub fn create_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    dptree::entry()
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(commands::handle_command),
                )
                .branch(dptree::endpoint(messages::handle_message)),
        )
        .branch(Update::filter_callback_query().endpoint(callbacks::handle_callback_query))
}
