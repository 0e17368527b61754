//! View builders
//!
//! All user-facing text and inline keyboards live here, so the flow handlers
//! read as state transitions rather than string formatting.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::events::CallbackEvent;
use crate::models::group::Group;
use crate::models::music::Music;
use crate::models::user::{User, UserStatistics};
use crate::render::View;
use crate::state::ShareCandidate;
use crate::sync::SyncOutcome;

fn button(label: &str, event: CallbackEvent) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label, event.tag())
}

fn back_row() -> Vec<InlineKeyboardButton> {
    vec![button("« Menu", CallbackEvent::Menu)]
}

pub fn main_menu(name: &str) -> View {
    let keyboard = InlineKeyboardMarkup::new(vec![
        vec![button("My account", CallbackEvent::Account)],
        vec![button("My groups", CallbackEvent::Groups)],
        vec![
            button("Share music", CallbackEvent::ShareMusic),
            button("Rate a track", CallbackEvent::RateTrack),
        ],
        vec![button("History", CallbackEvent::History)],
        vec![button("Connect music account", CallbackEvent::Token)],
    ]);

    View::text(format!(
        "Hi {name}! Share music with your friends, rate what they share, \
         and keep a common playlist in sync. What shall we do?"
    ))
    .with_keyboard(keyboard)
}

pub fn account_view(stats: &UserStatistics) -> View {
    let token_line = if stats.has_token {
        "linked"
    } else {
        "not linked"
    };
    let given = stats
        .average_score_given
        .map(|avg| format!("{avg:.2}"))
        .unwrap_or_else(|| "-".to_string());
    let received = stats
        .average_score_received
        .map(|avg| format!("{avg:.2}"))
        .unwrap_or_else(|| "-".to_string());

    View::text(format!(
        "Your account\n\
         Music service: {token_line}\n\
         Shared: {} entries\n\
         Ratings given: {} (avg {given})\n\
         Average score received: {received}",
        stats.count_of_sharing, stats.count_of_ratings
    ))
    .with_keyboard(InlineKeyboardMarkup::new(vec![back_row()]))
}

pub fn token_prompt() -> View {
    View::text(
        "Send me your music service token as a plain message.\n\
         You can get one from your account settings on the music service \
         website. The token lets me read your liked tracks and manage the \
         shared playlists.",
    )
    .with_keyboard(InlineKeyboardMarkup::new(vec![back_row()]))
}

pub fn token_saved() -> View {
    View::text("Token saved. Your music account is connected.")
        .with_keyboard(InlineKeyboardMarkup::new(vec![back_row()]))
}

pub fn groups_view(groups: &[(Group, Vec<User>)]) -> View {
    let mut text = String::from("Your groups:\n");
    if groups.is_empty() {
        text.push_str("none yet\n");
    }
    for (group, members) in groups {
        let names: Vec<&str> = members.iter().map(|m| m.name.as_str()).collect();
        text.push_str(&format!("\n{} — {}\n", group.name, names.join(", ")));
    }

    let mut rows: Vec<Vec<InlineKeyboardButton>> = groups
        .iter()
        .map(|(group, _)| {
            vec![button(
                &format!("Update playlist: {}", group.name),
                CallbackEvent::SyncPlaylist(group.id),
            )]
        })
        .collect();
    rows.push(vec![
        button("Create group", CallbackEvent::CreateGroup),
        button("Delete group", CallbackEvent::DeleteGroup),
    ]);
    rows.push(vec![button("Add user to group", CallbackEvent::AddUser)]);
    rows.push(back_row());

    View::text(text).with_keyboard(InlineKeyboardMarkup::new(rows))
}

pub fn group_name_prompt() -> View {
    View::text("What should the new group be called?")
        .with_keyboard(InlineKeyboardMarkup::new(vec![back_row()]))
}

pub fn group_created(name: &str) -> View {
    View::text(format!("Group \"{name}\" created. You are its first member."))
        .with_keyboard(InlineKeyboardMarkup::new(vec![back_row()]))
}

pub fn delete_pick_view(groups: &[Group]) -> View {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = groups
        .iter()
        .map(|g| vec![button(&g.name, CallbackEvent::DeleteGroupPick(g.id))])
        .collect();
    rows.push(back_row());

    View::text("Which group do you want to delete or leave?")
        .with_keyboard(InlineKeyboardMarkup::new(rows))
}

pub fn confirm_delete_view(group: &Group, is_creator: bool) -> View {
    let text = if is_creator {
        format!(
            "You created \"{}\". Deleting it removes the group for everyone. Are you sure?",
            group.name
        )
    } else {
        format!("Leave the group \"{}\"?", group.name)
    };

    View::text(text).with_keyboard(InlineKeyboardMarkup::new(vec![
        vec![button("Yes, I am sure", CallbackEvent::ConfirmDelete(group.id))],
        back_row(),
    ]))
}

pub fn group_removed() -> View {
    View::text("Done.").with_keyboard(InlineKeyboardMarkup::new(vec![back_row()]))
}

pub fn username_prompt() -> View {
    View::text("Send me the exact display name of the user to add. Names are case-sensitive.")
        .with_keyboard(InlineKeyboardMarkup::new(vec![back_row()]))
}

pub fn user_not_found(name: &str) -> View {
    View::text(format!(
        "I don't know anyone called \"{name}\". They need to start the bot first. Try another name."
    ))
    .with_keyboard(InlineKeyboardMarkup::new(vec![back_row()]))
}

pub fn invite_group_pick(invitee: &str, groups: &[Group]) -> View {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = groups
        .iter()
        .map(|g| vec![button(&g.name, CallbackEvent::Invite(g.id))])
        .collect();
    rows.push(back_row());

    View::text(format!("Which group should {invitee} join?"))
        .with_keyboard(InlineKeyboardMarkup::new(rows))
}

pub fn user_added(name: &str, group: &str) -> View {
    View::text(format!("{name} is now in \"{group}\"."))
        .with_keyboard(InlineKeyboardMarkup::new(vec![back_row()]))
}

pub fn share_group_pick(groups: &[Group]) -> View {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = groups
        .iter()
        .map(|g| vec![button(&g.name, CallbackEvent::ShareToGroup(g.id))])
        .collect();
    rows.push(back_row());

    View::text("Where do you want to share?").with_keyboard(InlineKeyboardMarkup::new(rows))
}

pub fn share_source_menu() -> View {
    View::text("What do you want to share?").with_keyboard(InlineKeyboardMarkup::new(vec![
        vec![button("My recent liked tracks", CallbackEvent::LikedTracks)],
        vec![
            button("Search a track", CallbackEvent::SearchTrack),
            button("Search an album", CallbackEvent::SearchAlbum),
        ],
        back_row(),
    ]))
}

pub fn search_prompt() -> View {
    View::text("Type your search query.")
        .with_keyboard(InlineKeyboardMarkup::new(vec![back_row()]))
}

pub fn candidate_pick_view(candidates: &[ShareCandidate]) -> View {
    if candidates.is_empty() {
        return View::text("Nothing found. Try a different query.")
            .with_keyboard(InlineKeyboardMarkup::new(vec![back_row()]));
    }

    let mut rows: Vec<Vec<InlineKeyboardButton>> = candidates
        .iter()
        .map(|c| {
            vec![button(
                &c.title,
                CallbackEvent::PickCandidate(c.catalog_id),
            )]
        })
        .collect();
    rows.push(back_row());

    View::text("Pick one:").with_keyboard(InlineKeyboardMarkup::new(rows))
}

pub fn comment_prompt(title: &str) -> View {
    View::text(format!(
        "\"{title}\" it is. Now write a few words about why you share it."
    ))
}

pub fn shared_confirmation(title: &str) -> View {
    View::text(format!("\"{title}\" shared with the group!"))
        .with_keyboard(InlineKeyboardMarkup::new(vec![back_row()]))
}

pub fn rate_group_pick(groups: &[Group]) -> View {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = groups
        .iter()
        .map(|g| vec![button(&g.name, CallbackEvent::RateInGroup(g.id))])
        .collect();
    rows.push(back_row());

    View::text("Whose group's tracks do you want to rate?")
        .with_keyboard(InlineKeyboardMarkup::new(rows))
}

/// One page of rateable tracks with pick and navigation buttons
pub fn rate_page_view(entries: &[Music], page: usize, last_page: usize) -> View {
    if entries.is_empty() {
        return View::text("No tracks from others to rate in this group yet.")
            .with_keyboard(InlineKeyboardMarkup::new(vec![back_row()]));
    }

    let mut rows: Vec<Vec<InlineKeyboardButton>> = entries
        .iter()
        .map(|m| vec![button(&m.title, CallbackEvent::PickCandidate(m.id))])
        .collect();

    let mut nav = Vec::new();
    if page > 0 {
        nav.push(button("« Prev", CallbackEvent::Prev(page as i64 - 1)));
    }
    if page < last_page {
        nav.push(button("Next »", CallbackEvent::Next(page as i64 + 1)));
    }
    if !nav.is_empty() {
        rows.push(nav);
    }
    rows.push(back_row());

    View::text(format!("Tracks to rate (page {} of {}):", page + 1, last_page + 1))
        .with_keyboard(InlineKeyboardMarkup::new(rows))
}

fn score_row(music_id: i64, quick: bool) -> Vec<InlineKeyboardButton> {
    (0..=5)
        .map(|score| {
            let event = if quick {
                CallbackEvent::Mark { score, music_id }
            } else {
                CallbackEvent::Rating { score, music_id }
            };
            button(&score.to_string(), event)
        })
        .collect()
}

/// A single track with its rating buttons
pub fn rating_view(music: &Music) -> View {
    let caption = format!(
        "{}\n\n{}\n\nCurrent score: {:.2} ({} ratings)",
        music.title, music.comment, music.average_mark, music.count_of_ratings
    );
    let keyboard = InlineKeyboardMarkup::new(vec![score_row(music.id, false), back_row()]);

    if music.has_cover() {
        View::photo(music.cover_url(), caption).with_keyboard(keyboard)
    } else {
        View::text(caption).with_keyboard(keyboard)
    }
}

pub fn rated_confirmation(music: &Music, score: i32) -> View {
    View::text(format!(
        "You gave \"{}\" a {score}. It now averages {:.2}.",
        music.title, music.average_mark
    ))
    .with_keyboard(InlineKeyboardMarkup::new(vec![back_row()]))
}

/// The share broadcast other members receive, with quick-rating buttons
pub fn broadcast_view(music: &Music, sharer: &str) -> View {
    let caption = format!("{sharer} shared:\n{}\n\n{}", music.title, music.comment);
    let keyboard = InlineKeyboardMarkup::new(vec![score_row(music.id, true)]);

    if music.has_cover() {
        View::photo(music.cover_url(), caption).with_keyboard(keyboard)
    } else {
        View::text(caption).with_keyboard(keyboard)
    }
}

pub fn history_menu() -> View {
    View::text("Whose history?").with_keyboard(InlineKeyboardMarkup::new(vec![
        vec![
            button("Mine, as a list", CallbackEvent::MyHistoryList),
            button("Mine, as a carousel", CallbackEvent::MyHistoryCarousel),
        ],
        vec![button("A group's history", CallbackEvent::GroupHistory)],
        back_row(),
    ]))
}

pub fn group_history_pick(groups: &[Group]) -> View {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = groups
        .iter()
        .flat_map(|g| {
            vec![vec![
                button(
                    &format!("{} (list)", g.name),
                    CallbackEvent::GroupHistoryList(g.id),
                ),
                button(
                    &format!("{} (carousel)", g.name),
                    CallbackEvent::GroupHistoryCarousel(g.id),
                ),
            ]]
        })
        .collect();
    rows.push(back_row());

    View::text("Which group's history?").with_keyboard(InlineKeyboardMarkup::new(rows))
}

pub fn history_empty() -> View {
    View::text("Nothing here yet. Share something first!")
        .with_keyboard(InlineKeyboardMarkup::new(vec![back_row()]))
}

pub fn history_list_view(entries: &[Music]) -> View {
    if entries.is_empty() {
        return history_empty();
    }

    let mut text = String::from("Sharing history:\n");
    for music in entries {
        let group = match music.group_id {
            Some(_) => String::new(),
            None => " (no group)".to_string(),
        };
        text.push_str(&format!(
            "\n{} [{}]{group} — {:.2} ({} ratings)",
            music.title, music.kind, music.average_mark, music.count_of_ratings
        ));
    }

    View::text(text).with_keyboard(InlineKeyboardMarkup::new(vec![back_row()]))
}

/// One carousel position with navigation
pub fn history_carousel_view(music: &Music, index: usize, total: usize) -> View {
    let caption = format!(
        "{} of {}\n{}\n\n{}\n\nScore: {:.2} ({} ratings)",
        index + 1,
        total,
        music.title,
        music.comment,
        music.average_mark,
        music.count_of_ratings
    );

    let nav = vec![
        button("«", CallbackEvent::Prev(index as i64 - 1)),
        button("»", CallbackEvent::Next(index as i64 + 1)),
    ];
    let keyboard = InlineKeyboardMarkup::new(vec![nav, back_row()]);

    if music.has_cover() {
        View::photo(music.cover_url(), caption).with_keyboard(keyboard)
    } else {
        View::text(caption).with_keyboard(keyboard)
    }
}

pub fn sync_result_view(outcome: &SyncOutcome) -> View {
    let mut text = format!(
        "Playlist updated: {} track(s) added remotely, {} pulled into the group log.",
        outcome.pushed, outcome.pulled
    );
    if outcome.recreated {
        text.push_str(" The old playlist had vanished, so I created a new one.");
    }

    View::text(text).with_keyboard(InlineKeyboardMarkup::new(vec![back_row()]))
}

pub fn error_view(message: String) -> View {
    View::text(message).with_keyboard(InlineKeyboardMarkup::new(vec![back_row()]))
}

pub fn help_view() -> View {
    View::text(
        "I connect small groups of friends around music.\n\n\
         /start — main menu\n\
         /account — your statistics\n\
         /token — connect your music service account\n\
         /help — this message\n\n\
         Everything else works through the buttons.",
    )
}

/// Page arithmetic for the rate-flow list. The requested page is clamped to
/// the valid range; an empty list collapses to a single empty page.
pub fn clamp_page(len: usize, page_size: usize, requested: i64) -> usize {
    let last = last_page(len, page_size) as i64;
    requested.clamp(0, last) as usize
}

pub fn last_page(len: usize, page_size: usize) -> usize {
    if len == 0 {
        0
    } else {
        (len - 1) / page_size.max(1)
    }
}

pub fn page_slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let start = page * page_size;
    if start >= items.len() {
        return &[];
    }
    let end = (start + page_size).min(items.len());
    &items[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_clamps_to_valid_range() {
        assert_eq!(clamp_page(12, 5, -3), 0);
        assert_eq!(clamp_page(12, 5, 1), 1);
        assert_eq!(clamp_page(12, 5, 99), 2);
        assert_eq!(clamp_page(0, 5, 7), 0);
    }

    #[test]
    fn last_page_counts_partial_pages() {
        assert_eq!(last_page(0, 5), 0);
        assert_eq!(last_page(5, 5), 0);
        assert_eq!(last_page(6, 5), 1);
        assert_eq!(last_page(11, 5), 2);
    }

    #[test]
    fn page_slice_returns_the_requested_window() {
        let items: Vec<i32> = (0..12).collect();
        assert_eq!(page_slice(&items, 0, 5), &[0, 1, 2, 3, 4]);
        assert_eq!(page_slice(&items, 2, 5), &[10, 11]);
        assert!(page_slice(&items, 9, 5).is_empty());
    }
}
