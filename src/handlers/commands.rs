//! Command handlers
//!
//! Commands work in every dialog state. `/start` doubles as the universal
//! escape hatch: it always lands the user back at the menu.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{debug, error, info};

use crate::handlers::{failure_state, views, AppContext, Command, HandlerResult};
use crate::render::RenderTarget;
use crate::state::DialogState;
use crate::utils::errors::Result;

pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    app: Arc<AppContext>,
) -> HandlerResult {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = user.id.0 as i64;
    let name = user.full_name();
    let target = RenderTarget::from_message(bot, &msg);

    debug!(user_id, "processing command");

    let outcome = match cmd {
        Command::Start => start(&app, user_id, &name, &target).await,
        Command::Help => target.render(views::help_view()).await,
        Command::Token => token(&app, user_id, &target).await,
        Command::Account => account(&app, user_id, &target).await,
    };

    if let Err(e) = outcome {
        error!(user_id, error = %e, "command handler failed");
        if let Some(state) = failure_state(&e) {
            let mut ctx = app.storage.load(user_id).await;
            ctx.transition(state, crate::state::FlowData::None);
            app.storage.save(ctx).await;
        }
        let _ = target.render(views::error_view(e.user_message())).await;
    }

    Ok(())
}

/// `/start`: register the user if needed and show the main menu
async fn start(app: &AppContext, user_id: i64, name: &str, target: &RenderTarget) -> Result<()> {
    let user = app.db.register_user(user_id, name).await?;

    let mut ctx = app.storage.load(user_id).await;
    ctx.reset();
    app.storage.save(ctx).await;

    info!(user_id, "user at main menu");
    target.render(views::main_menu(&user.name)).await
}

/// `/token`: enter the token-entry flow
async fn token(app: &AppContext, user_id: i64, target: &RenderTarget) -> Result<()> {
    let mut ctx = app.storage.load(user_id).await;
    ctx.transition(DialogState::AwaitingToken, crate::state::FlowData::None);
    app.storage.save(ctx).await;

    target.render(views::token_prompt()).await
}

/// `/account`: show statistics without leaving the current state
async fn account(app: &AppContext, user_id: i64, target: &RenderTarget) -> Result<()> {
    let stats = app.db.user_statistics(user_id).await?;
    target.render(views::account_view(&stats)).await
}
