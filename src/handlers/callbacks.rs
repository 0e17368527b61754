//! Callback query handlers
//!
//! Every button press is decoded once into a [`CallbackEvent`] and routed
//! through one exhaustive match over (dialog state, event). Presses that do
//! not fit the current state are stale keyboards from earlier messages and
//! are dropped without an error.

use std::sync::Arc;

use teloxide::payloads::AnswerCallbackQuerySetters;
use teloxide::prelude::*;
use tracing::{debug, error, info, warn};

use crate::events::CallbackEvent;
use crate::handlers::{failure_state, views, AppContext, HandlerResult};
use crate::models::group::Group;
use crate::models::music::Music;
use crate::models::user::User;
use crate::render::{RenderTarget, View};
use crate::state::{
    ConversationContext, DialogState, FlowData, GroupAdminFlow, HistoryFlow, RateFlow,
    SearchMode, ShareCandidate, ShareFlow,
};
use crate::utils::errors::{ProviderError, Result, TuneCircleError};

pub async fn handle_callback_query(
    bot: Bot,
    query: CallbackQuery,
    app: Arc<AppContext>,
) -> HandlerResult {
    let user_id = query.from.id.0 as i64;
    let user_name = query.from.full_name();

    let Some(event) = query.data.as_deref().and_then(CallbackEvent::parse) else {
        debug!(user_id, "unparseable callback payload, dropped");
        let _ = bot.answer_callback_query(query.id.clone()).await;
        return Ok(());
    };

    // Quick ratings on share broadcasts are valid in any dialog state; the
    // answer popup is the whole feedback, so handle them before anything else.
    if let CallbackEvent::Mark { score, music_id } = event {
        let answer = match app.db.record_rating(user_id, music_id, score).await {
            Ok(music) => {
                info!(user_id, music_id, score, "quick rating recorded");
                format!("You gave \"{}\" a {score}", music.title)
            }
            Err(e) => {
                warn!(user_id, music_id, error = %e, "quick rating failed");
                e.user_message()
            }
        };
        let _ = bot
            .answer_callback_query(query.id.clone())
            .text(answer)
            .await;
        return Ok(());
    }

    let _ = bot.answer_callback_query(query.id.clone()).await;

    let target = RenderTarget::from_callback(bot.clone(), &query)
        .unwrap_or_else(|| RenderTarget::to_chat(bot.clone(), ChatId(user_id)));

    if let Err(e) = dispatch(&app, user_id, &user_name, event, &target).await {
        error!(user_id, error = %e, "callback handler failed");
        if let Some(state) = failure_state(&e) {
            let mut ctx = app.storage.load(user_id).await;
            ctx.transition(state, FlowData::None);
            app.storage.save(ctx).await;
        }
        let _ = target.render(views::error_view(e.user_message())).await;
    }

    Ok(())
}

async fn dispatch(
    app: &AppContext,
    user_id: i64,
    user_name: &str,
    event: CallbackEvent,
    target: &RenderTarget,
) -> Result<()> {
    let mut ctx = app.storage.load(user_id).await;

    // The menu button is the universal back affordance.
    if event == CallbackEvent::Menu {
        ctx.reset();
        app.storage.save(ctx).await;
        return target.render(views::main_menu(user_name)).await;
    }

    match (ctx.state, event) {
        (DialogState::Menu, event) => menu_event(app, ctx, event, target).await,
        (DialogState::AwaitingGroupDeletionChoice, CallbackEvent::DeleteGroupPick(group_id)) => {
            show_delete_confirmation(app, &ctx, group_id, target).await
        }
        (DialogState::AwaitingGroupDeletionChoice, CallbackEvent::ConfirmDelete(group_id)) => {
            delete_or_leave(app, ctx, group_id, target).await
        }
        (DialogState::AwaitingGroupForUserAdd, CallbackEvent::Invite(group_id)) => {
            invite_into_group(app, ctx, group_id, target).await
        }
        (DialogState::AwaitingShareTarget, event) => share_event(app, ctx, event, target).await,
        (DialogState::AwaitingRatingTarget, event) => rate_event(app, ctx, event, target).await,
        (DialogState::BrowsingHistory, event) => history_event(app, ctx, event, target).await,
        (state, event) => {
            debug!(user_id, ?state, ?event, "event has no meaning in this state, dropped");
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Menu-level events

async fn menu_event(
    app: &AppContext,
    mut ctx: ConversationContext,
    event: CallbackEvent,
    target: &RenderTarget,
) -> Result<()> {
    let user_id = ctx.user_id;

    match event {
        CallbackEvent::Account => {
            let stats = app.db.user_statistics(user_id).await?;
            target.render(views::account_view(&stats)).await
        }
        CallbackEvent::Groups => {
            let list = groups_with_members(app, user_id).await?;
            target.render(views::groups_view(&list)).await
        }
        CallbackEvent::CreateGroup => {
            ctx.transition(DialogState::AwaitingGroupName, FlowData::None);
            app.storage.save(ctx).await;
            target.render(views::group_name_prompt()).await
        }
        CallbackEvent::DeleteGroup => {
            let groups = app.db.groups.groups_of(user_id).await?;
            ctx.transition(DialogState::AwaitingGroupDeletionChoice, FlowData::None);
            app.storage.save(ctx).await;
            target.render(views::delete_pick_view(&groups)).await
        }
        CallbackEvent::AddUser => {
            ctx.transition(
                DialogState::AwaitingUsername,
                FlowData::GroupAdmin(GroupAdminFlow::default()),
            );
            app.storage.save(ctx).await;
            target.render(views::username_prompt()).await
        }
        CallbackEvent::Token => {
            ctx.transition(DialogState::AwaitingToken, FlowData::None);
            app.storage.save(ctx).await;
            target.render(views::token_prompt()).await
        }
        CallbackEvent::ShareMusic => {
            let groups = app.db.groups.groups_of(user_id).await?;
            target.render(views::share_group_pick(&groups)).await
        }
        CallbackEvent::ShareToGroup(group_id) => {
            require_membership(app, group_id, user_id).await?;
            ctx.transition(
                DialogState::AwaitingShareTarget,
                FlowData::Share(ShareFlow::new(group_id)),
            );
            app.storage.save(ctx).await;
            target.render(views::share_source_menu()).await
        }
        CallbackEvent::RateTrack => {
            let groups = app.db.groups.groups_of(user_id).await?;
            target.render(views::rate_group_pick(&groups)).await
        }
        CallbackEvent::RateInGroup(group_id) => {
            require_membership(app, group_id, user_id).await?;
            let tracks = app.db.music.rateable_tracks(group_id, user_id).await?;
            if tracks.is_empty() {
                return target.render(views::rate_page_view(&[], 0, 0)).await;
            }

            let music_ids: Vec<i64> = tracks.iter().map(|m| m.id).collect();
            let page_size = app.settings.limits.page_size;
            let view = rate_page(app, &music_ids, 0, page_size).await?;

            ctx.transition(
                DialogState::AwaitingRatingTarget,
                FlowData::Rate(RateFlow {
                    group_id,
                    music_ids,
                    page: 0,
                }),
            );
            app.storage.save(ctx).await;
            target.render(view).await
        }
        CallbackEvent::History => target.render(views::history_menu()).await,
        CallbackEvent::MyHistoryList => {
            let entries = app.db.music.user_log(user_id).await?;
            target.render(views::history_list_view(&entries)).await
        }
        CallbackEvent::MyHistoryCarousel => {
            let entries = app.db.music.user_log(user_id).await?;
            enter_carousel(app, ctx, entries, target).await
        }
        CallbackEvent::GroupHistory => {
            let groups = app.db.groups.groups_of(user_id).await?;
            target.render(views::group_history_pick(&groups)).await
        }
        CallbackEvent::GroupHistoryList(group_id) => {
            require_membership(app, group_id, user_id).await?;
            let entries = app.db.music.group_log(group_id).await?;
            target.render(views::history_list_view(&entries)).await
        }
        CallbackEvent::GroupHistoryCarousel(group_id) => {
            require_membership(app, group_id, user_id).await?;
            let entries = app.db.music.group_log(group_id).await?;
            enter_carousel(app, ctx, entries, target).await
        }
        CallbackEvent::SyncPlaylist(group_id) => {
            info!(user_id, group_id, "on-demand playlist reconciliation requested");
            let outcome = app.sync.reconcile_on_demand(user_id, group_id).await?;
            target.render(views::sync_result_view(&outcome)).await
        }
        event => {
            debug!(user_id, ?event, "event has no meaning at the menu, dropped");
            Ok(())
        }
    }
}

/// Group-scoped buttons carry the group id in the payload, which a modified
/// client can forge. Every such arm re-checks membership before acting.
async fn require_membership(app: &AppContext, group_id: i64, user_id: i64) -> Result<()> {
    if !app.db.groups.is_member(group_id, user_id).await? {
        return Err(TuneCircleError::InvalidInput(
            "You are not a member of that group.".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Group administration

async fn show_delete_confirmation(
    app: &AppContext,
    ctx: &ConversationContext,
    group_id: i64,
    target: &RenderTarget,
) -> Result<()> {
    let group = app
        .db
        .groups
        .find_by_id(group_id)
        .await?
        .ok_or(TuneCircleError::GroupNotFound { group_id })?;

    let is_creator = group.is_creator(ctx.user_id);
    target
        .render(views::confirm_delete_view(&group, is_creator))
        .await
}

async fn delete_or_leave(
    app: &AppContext,
    mut ctx: ConversationContext,
    group_id: i64,
    target: &RenderTarget,
) -> Result<()> {
    app.db.leave_or_delete_group(ctx.user_id, group_id).await?;
    ctx.reset();
    app.storage.save(ctx).await;

    target.render(views::group_removed()).await
}

async fn invite_into_group(
    app: &AppContext,
    mut ctx: ConversationContext,
    group_id: i64,
    target: &RenderTarget,
) -> Result<()> {
    let (invitee_id, invitee_name) = match ctx.group_admin_flow_mut() {
        Some(flow) => match (flow.invitee_id, flow.invitee_name.clone()) {
            (Some(id), Some(name)) => (id, name),
            _ => return Ok(()),
        },
        None => return Ok(()),
    };

    let group = app
        .db
        .groups
        .find_by_id(group_id)
        .await?
        .ok_or(TuneCircleError::GroupNotFound { group_id })?;

    app.db.add_member(group_id, invitee_id).await?;

    ctx.reset();
    app.storage.save(ctx).await;

    target
        .render(views::user_added(&invitee_name, &group.name))
        .await
}

// ---------------------------------------------------------------------------
// Share flow

async fn share_event(
    app: &AppContext,
    mut ctx: ConversationContext,
    event: CallbackEvent,
    target: &RenderTarget,
) -> Result<()> {
    let user_id = ctx.user_id;

    match event {
        CallbackEvent::LikedTracks => {
            let token = app
                .db
                .users
                .token(user_id)
                .await?
                .ok_or(TuneCircleError::Provider(ProviderError::AuthFailed))?;

            let count = app.settings.limits.liked_tracks_count;
            let candidates: Vec<ShareCandidate> = app
                .provider
                .liked_tracks(&token, count)
                .await?
                .into_iter()
                .map(|t| ShareCandidate {
                    catalog_id: t.id,
                    kind: crate::models::MusicKind::Track,
                    title: t.display_title(),
                    cover_uri: t.cover_uri,
                })
                .collect();

            let view = views::candidate_pick_view(&candidates);
            if let Some(flow) = ctx.share_flow_mut() {
                flow.candidates = candidates;
            }
            app.storage.save(ctx).await;
            target.render(view).await
        }
        CallbackEvent::SearchTrack | CallbackEvent::SearchAlbum => {
            let mode = if event == CallbackEvent::SearchTrack {
                SearchMode::Track
            } else {
                SearchMode::Album
            };
            if let Some(flow) = ctx.share_flow_mut() {
                flow.mode = Some(mode);
            }
            ctx.state = DialogState::AwaitingSearchQuery;
            app.storage.save(ctx).await;
            target.render(views::search_prompt()).await
        }
        CallbackEvent::PickCandidate(catalog_id) => {
            let picked = ctx
                .share_flow_mut()
                .and_then(|flow| flow.candidate(catalog_id).cloned());
            let Some(picked) = picked else {
                debug!(user_id, catalog_id, "picked candidate is not on offer, dropped");
                return Ok(());
            };

            let title = picked.title.clone();
            if let Some(flow) = ctx.share_flow_mut() {
                flow.picked = Some(picked);
            }
            ctx.state = DialogState::AwaitingComment;
            app.storage.save(ctx).await;
            target.render(views::comment_prompt(&title)).await
        }
        event => {
            debug!(user_id, ?event, "event has no meaning while picking music, dropped");
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Rate flow

async fn rate_event(
    app: &AppContext,
    mut ctx: ConversationContext,
    event: CallbackEvent,
    target: &RenderTarget,
) -> Result<()> {
    let user_id = ctx.user_id;
    let page_size = app.settings.limits.page_size;

    match event {
        CallbackEvent::Prev(requested) | CallbackEvent::Next(requested) => {
            let (music_ids, page) = match ctx.rate_flow_mut() {
                Some(flow) => {
                    let page = views::clamp_page(flow.music_ids.len(), page_size, requested);
                    flow.page = page;
                    (flow.music_ids.clone(), page)
                }
                None => return Ok(()),
            };
            app.storage.save(ctx).await;

            let view = rate_page(app, &music_ids, page, page_size).await?;
            target.render(view).await
        }
        CallbackEvent::PickCandidate(music_id) => {
            let on_offer = ctx
                .rate_flow_mut()
                .map(|flow| flow.music_ids.contains(&music_id))
                .unwrap_or(false);
            if !on_offer {
                debug!(user_id, music_id, "picked track is not on offer, dropped");
                return Ok(());
            }

            let music = app
                .db
                .music
                .find_by_id(music_id)
                .await?
                .ok_or(TuneCircleError::MusicNotFound { music_id })?;
            target.render(views::rating_view(&music)).await
        }
        CallbackEvent::Rating { score, music_id } => {
            let music = app.db.record_rating(user_id, music_id, score).await?;
            info!(user_id, music_id, score, "rating recorded");

            ctx.reset();
            app.storage.save(ctx).await;
            target.render(views::rated_confirmation(&music, score)).await
        }
        event => {
            debug!(user_id, ?event, "event has no meaning while rating, dropped");
            Ok(())
        }
    }
}

/// Build one page of the rateable-track list from the snapshot ids. Entries
/// deleted since the snapshot simply fall out of the page.
async fn rate_page(
    app: &AppContext,
    music_ids: &[i64],
    page: usize,
    page_size: usize,
) -> Result<View> {
    let mut entries: Vec<Music> = Vec::new();
    for music_id in views::page_slice(music_ids, page, page_size) {
        if let Some(music) = app.db.music.find_by_id(*music_id).await? {
            entries.push(music);
        }
    }

    let last = views::last_page(music_ids.len(), page_size);
    Ok(views::rate_page_view(&entries, page, last))
}

// ---------------------------------------------------------------------------
// History browsing

async fn enter_carousel(
    app: &AppContext,
    mut ctx: ConversationContext,
    entries: Vec<Music>,
    target: &RenderTarget,
) -> Result<()> {
    if entries.is_empty() {
        return target.render(views::history_empty()).await;
    }

    let first = entries[0].clone();
    let total = entries.len();
    let music_ids = entries.into_iter().map(|m| m.id).collect();

    ctx.transition(
        DialogState::BrowsingHistory,
        FlowData::History(HistoryFlow::new(music_ids)),
    );
    app.storage.save(ctx).await;

    target
        .render(views::history_carousel_view(&first, 0, total))
        .await
}

async fn history_event(
    app: &AppContext,
    mut ctx: ConversationContext,
    event: CallbackEvent,
    target: &RenderTarget,
) -> Result<()> {
    let user_id = ctx.user_id;

    match event {
        CallbackEvent::Prev(requested) | CallbackEvent::Next(requested) => {
            let (current, index, total) = match ctx.history_flow_mut() {
                Some(flow) => {
                    flow.seek(requested);
                    (flow.current(), flow.index, flow.music_ids.len())
                }
                None => return Ok(()),
            };
            app.storage.save(ctx).await;

            let Some(music_id) = current else {
                return target.render(views::history_empty()).await;
            };
            // The entry may be gone since the snapshot; say so instead of failing.
            let Some(music) = app.db.music.find_by_id(music_id).await? else {
                return target.render(views::history_empty()).await;
            };
            target
                .render(views::history_carousel_view(&music, index, total))
                .await
        }
        event => {
            debug!(user_id, ?event, "event has no meaning while browsing history, dropped");
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------

async fn groups_with_members(
    app: &AppContext,
    user_id: i64,
) -> Result<Vec<(Group, Vec<User>)>> {
    let groups = app.db.groups.groups_of(user_id).await?;
    let mut list = Vec::with_capacity(groups.len());
    for group in groups {
        let members = app.db.groups.members(group.id).await?;
        list.push((group, members));
    }
    Ok(list)
}
