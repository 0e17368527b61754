//! Free-text message handlers
//!
//! Plain text only means something in the states that asked for it: token
//! entry, group naming, username entry, search queries and share comments.
//! Everywhere else it is dropped.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{debug, error, warn};

use crate::handlers::{failure_state, views, AppContext, HandlerResult};
use crate::models::music::NewMusic;
use crate::render::RenderTarget;
use crate::state::{
    ConversationContext, DialogState, FlowData, GroupAdminFlow, SearchMode, ShareCandidate,
};
use crate::utils::errors::{ProviderError, Result, TuneCircleError};

pub async fn handle_message(bot: Bot, msg: Message, app: Arc<AppContext>) -> HandlerResult {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let user_id = user.id.0 as i64;
    let sharer_name = user.full_name();
    let target = RenderTarget::from_message(bot.clone(), &msg);

    let ctx = app.storage.load(user_id).await;
    debug!(user_id, state = ?ctx.state, "processing free text");

    let outcome = match ctx.state {
        DialogState::AwaitingToken => save_token(&app, ctx, text, &target).await,
        DialogState::AwaitingGroupName => create_group(&app, ctx, text, &target).await,
        DialogState::AwaitingUsername => resolve_username(&app, ctx, text, &target).await,
        DialogState::AwaitingSearchQuery => run_search(&app, ctx, text, &target).await,
        DialogState::AwaitingComment => {
            finish_share(&bot, &app, ctx, text, &sharer_name, &target).await
        }
        _ => {
            debug!(user_id, "free text has no meaning here, dropped");
            Ok(())
        }
    };

    if let Err(e) = outcome {
        error!(user_id, error = %e, "message handler failed");
        if let Some(state) = failure_state(&e) {
            let mut ctx = app.storage.load(user_id).await;
            ctx.transition(state, FlowData::None);
            app.storage.save(ctx).await;
        }
        let _ = target.render(views::error_view(e.user_message())).await;
    }

    Ok(())
}

async fn save_token(
    app: &AppContext,
    mut ctx: ConversationContext,
    token: &str,
    target: &RenderTarget,
) -> Result<()> {
    let token = token.trim();
    if token.is_empty() {
        return Err(TuneCircleError::InvalidInput(
            "The token cannot be empty, try again.".to_string(),
        ));
    }

    app.db.users.update_token(ctx.user_id, token).await?;
    ctx.reset();
    app.storage.save(ctx).await;

    target.render(views::token_saved()).await
}

async fn create_group(
    app: &AppContext,
    mut ctx: ConversationContext,
    name: &str,
    target: &RenderTarget,
) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TuneCircleError::InvalidInput(
            "A group needs a name, try again.".to_string(),
        ));
    }

    let group = app.db.create_group(ctx.user_id, name).await?;
    ctx.reset();
    app.storage.save(ctx).await;

    target.render(views::group_created(&group.name)).await
}

async fn resolve_username(
    app: &AppContext,
    mut ctx: ConversationContext,
    name: &str,
    target: &RenderTarget,
) -> Result<()> {
    let name = name.trim();

    // Exact, case-sensitive match; a miss keeps the user in this state.
    let Some(invitee) = app.db.users.find_by_name(name).await? else {
        return target.render(views::user_not_found(name)).await;
    };

    let groups = app.db.groups.groups_of(ctx.user_id).await?;
    ctx.transition(
        DialogState::AwaitingGroupForUserAdd,
        FlowData::GroupAdmin(GroupAdminFlow {
            invitee_id: Some(invitee.id),
            invitee_name: Some(invitee.name.clone()),
        }),
    );
    app.storage.save(ctx).await;

    target
        .render(views::invite_group_pick(&invitee.name, &groups))
        .await
}

async fn run_search(
    app: &AppContext,
    mut ctx: ConversationContext,
    query: &str,
    target: &RenderTarget,
) -> Result<()> {
    let user_id = ctx.user_id;
    let mode = match ctx.share_flow_mut().and_then(|flow| flow.mode) {
        Some(mode) => mode,
        None => {
            debug!(user_id, "search query without a share flow, dropped");
            return Ok(());
        }
    };

    let token = app
        .db
        .users
        .token(user_id)
        .await?
        .ok_or(TuneCircleError::Provider(ProviderError::AuthFailed))?;

    let candidates: Vec<ShareCandidate> = match mode {
        SearchMode::Track => app
            .provider
            .search_tracks(&token, query)
            .await?
            .into_iter()
            .map(|t| ShareCandidate {
                catalog_id: t.id,
                kind: crate::models::MusicKind::Track,
                title: t.display_title(),
                cover_uri: t.cover_uri,
            })
            .collect(),
        SearchMode::Album => app
            .provider
            .search_albums(&token, query)
            .await?
            .into_iter()
            .map(|a| ShareCandidate {
                catalog_id: a.id,
                kind: crate::models::MusicKind::Album,
                title: a.display_title(),
                cover_uri: a.cover_uri,
            })
            .collect(),
    };

    if candidates.is_empty() {
        // Stay here so the user can just type another query.
        return target.render(views::candidate_pick_view(&[])).await;
    }

    let view = views::candidate_pick_view(&candidates);
    if let Some(flow) = ctx.share_flow_mut() {
        flow.candidates = candidates;
    }
    ctx.state = DialogState::AwaitingShareTarget;
    app.storage.save(ctx).await;

    target.render(view).await
}

async fn finish_share(
    bot: &Bot,
    app: &AppContext,
    mut ctx: ConversationContext,
    comment: &str,
    sharer_name: &str,
    target: &RenderTarget,
) -> Result<()> {
    let user_id = ctx.user_id;
    let Some(flow) = ctx.share_flow_mut() else {
        debug!(user_id, "comment without a share flow, dropped");
        return Ok(());
    };
    let group_id = flow.group_id;
    let Some(picked) = flow.picked.take() else {
        debug!(user_id, "comment before picking anything, dropped");
        return Ok(());
    };

    let music = app
        .db
        .share_music(&NewMusic {
            catalog_id: picked.catalog_id,
            kind: picked.kind,
            title: picked.title,
            comment: comment.trim().to_string(),
            cover_uri: picked.cover_uri,
            imported: false,
            user_id,
            group_id: Some(group_id),
        })
        .await?;

    // Tell everyone else in the group, with quick-rating buttons attached.
    // A member we cannot reach must not break the share for the rest.
    let members = app.db.groups.members(group_id).await?;
    for member in members {
        if member.id == user_id {
            continue;
        }
        let broadcast = RenderTarget::to_chat(bot.clone(), ChatId(member.id));
        if let Err(e) = broadcast
            .render(views::broadcast_view(&music, sharer_name))
            .await
        {
            warn!(user_id = member.id, error = %e, "share broadcast failed for member");
        }
    }

    let title = music.title.clone();
    ctx.reset();
    app.storage.save(ctx).await;

    target.render(views::shared_confirmation(&title)).await
}
