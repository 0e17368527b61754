//! Callback event decoding
//!
//! Inline-keyboard presses arrive as `prefix` or `prefix_arg` (or
//! `prefix_arg1_arg2`) strings. They are decoded exactly once here, at the
//! dispatch boundary, into a closed enum; handlers match on variants and
//! never look at the raw string again. Unknown or malformed payloads decode
//! to `None` and the press is dropped.

/// Every inline-keyboard press the bot understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackEvent {
    /// Back to the main menu
    Menu,
    /// Show account statistics
    Account,
    /// Show the group-management view
    Groups,
    /// Begin group creation
    CreateGroup,
    /// Begin group deletion/leaving
    DeleteGroup,
    /// Begin inviting a user by display name
    AddUser,
    /// Begin token entry
    Token,
    /// Begin the share flow
    ShareMusic,
    /// Begin the rate flow
    RateTrack,
    /// Show the history menu
    History,
    /// Own history as a flat list
    MyHistoryList,
    /// Own history as a carousel
    MyHistoryCarousel,
    /// Pick a group whose history to browse
    GroupHistory,
    /// Offer recent liked tracks in the share flow
    LikedTracks,
    /// Ask for a track search query
    SearchTrack,
    /// Ask for an album search query
    SearchAlbum,
    /// Share into this group
    ShareToGroup(i64),
    /// Candidate picked in the share flow
    PickCandidate(i64),
    /// Rate tracks of this group
    RateInGroup(i64),
    /// Group picked for deletion, confirmation follows
    DeleteGroupPick(i64),
    /// Deletion confirmed
    ConfirmDelete(i64),
    /// Found user joins this group
    Invite(i64),
    /// Score given inside the rate flow
    Rating { score: i32, music_id: i64 },
    /// Quick score given on a share broadcast, valid in any state
    Mark { score: i32, music_id: i64 },
    /// Navigate to the previous page or carousel position
    Prev(i64),
    /// Navigate to the next page or carousel position
    Next(i64),
    /// Create or update the shared playlist for this group
    SyncPlaylist(i64),
    /// This group's history as a flat list
    GroupHistoryList(i64),
    /// This group's history as a carousel
    GroupHistoryCarousel(i64),
}

impl CallbackEvent {
    /// Decode a raw callback payload. Returns `None` for anything the bot
    /// did not produce itself.
    pub fn parse(data: &str) -> Option<CallbackEvent> {
        use CallbackEvent::*;

        // Fixed tags first; some are prefixes of parameterized ones.
        match data {
            "menu" => return Some(Menu),
            "account" => return Some(Account),
            "groups" => return Some(Groups),
            "create_group" => return Some(CreateGroup),
            "delete_group" => return Some(DeleteGroup),
            "add_user" => return Some(AddUser),
            "token" => return Some(Token),
            "share_music" => return Some(ShareMusic),
            "rate_track" => return Some(RateTrack),
            "history" => return Some(History),
            "my_history_list" => return Some(MyHistoryList),
            "my_history_carousel" => return Some(MyHistoryCarousel),
            "group_history" => return Some(GroupHistory),
            "liked" => return Some(LikedTracks),
            "search_track" => return Some(SearchTrack),
            "search_album" => return Some(SearchAlbum),
            _ => {}
        }

        if let Some(rest) = data.strip_prefix("rating_") {
            return parse_scored(rest).map(|(score, music_id)| Rating { score, music_id });
        }
        if let Some(rest) = data.strip_prefix("mark_") {
            return parse_scored(rest).map(|(score, music_id)| Mark { score, music_id });
        }

        let (prefix, arg) = data.rsplit_once('_')?;
        let arg: i64 = arg.parse().ok()?;

        match prefix {
            "share" => Some(ShareToGroup(arg)),
            "chosen" => Some(PickCandidate(arg)),
            "rate" => Some(RateInGroup(arg)),
            "delete" => Some(DeleteGroupPick(arg)),
            "exactly" => Some(ConfirmDelete(arg)),
            "invite" => Some(Invite(arg)),
            "prev" => Some(Prev(arg)),
            "next" => Some(Next(arg)),
            "playlist" => Some(SyncPlaylist(arg)),
            "histlist" => Some(GroupHistoryList(arg)),
            "histwheel" => Some(GroupHistoryCarousel(arg)),
            _ => None,
        }
    }

    /// Encode the event back into its wire tag, for building keyboards
    pub fn tag(&self) -> String {
        use CallbackEvent::*;

        match self {
            Menu => "menu".to_string(),
            Account => "account".to_string(),
            Groups => "groups".to_string(),
            CreateGroup => "create_group".to_string(),
            DeleteGroup => "delete_group".to_string(),
            AddUser => "add_user".to_string(),
            Token => "token".to_string(),
            ShareMusic => "share_music".to_string(),
            RateTrack => "rate_track".to_string(),
            History => "history".to_string(),
            MyHistoryList => "my_history_list".to_string(),
            MyHistoryCarousel => "my_history_carousel".to_string(),
            GroupHistory => "group_history".to_string(),
            LikedTracks => "liked".to_string(),
            SearchTrack => "search_track".to_string(),
            SearchAlbum => "search_album".to_string(),
            ShareToGroup(id) => format!("share_{id}"),
            PickCandidate(id) => format!("chosen_{id}"),
            RateInGroup(id) => format!("rate_{id}"),
            DeleteGroupPick(id) => format!("delete_{id}"),
            ConfirmDelete(id) => format!("exactly_{id}"),
            Invite(id) => format!("invite_{id}"),
            Rating { score, music_id } => format!("rating_{score}_{music_id}"),
            Mark { score, music_id } => format!("mark_{score}_{music_id}"),
            Prev(i) => format!("prev_{i}"),
            Next(i) => format!("next_{i}"),
            SyncPlaylist(id) => format!("playlist_{id}"),
            GroupHistoryList(id) => format!("histlist_{id}"),
            GroupHistoryCarousel(id) => format!("histwheel_{id}"),
        }
    }
}

fn parse_scored(rest: &str) -> Option<(i32, i64)> {
    let (score, music_id) = rest.split_once('_')?;
    let score: i32 = score.parse().ok()?;
    if !(0..=5).contains(&score) {
        return None;
    }
    Some((score, music_id.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_tags_decode() {
        assert_eq!(CallbackEvent::parse("menu"), Some(CallbackEvent::Menu));
        assert_eq!(
            CallbackEvent::parse("share_music"),
            Some(CallbackEvent::ShareMusic)
        );
        assert_eq!(
            CallbackEvent::parse("search_album"),
            Some(CallbackEvent::SearchAlbum)
        );
    }

    #[test]
    fn parameterized_tags_decode() {
        assert_eq!(
            CallbackEvent::parse("share_17"),
            Some(CallbackEvent::ShareToGroup(17))
        );
        assert_eq!(
            CallbackEvent::parse("exactly_3"),
            Some(CallbackEvent::ConfirmDelete(3))
        );
        assert_eq!(
            CallbackEvent::parse("prev_0"),
            Some(CallbackEvent::Prev(0))
        );
    }

    #[test]
    fn scored_tags_carry_both_arguments() {
        assert_eq!(
            CallbackEvent::parse("rating_4_981"),
            Some(CallbackEvent::Rating {
                score: 4,
                music_id: 981
            })
        );
        assert_eq!(
            CallbackEvent::parse("mark_0_12"),
            Some(CallbackEvent::Mark {
                score: 0,
                music_id: 12
            })
        );
    }

    #[test]
    fn out_of_range_scores_are_dropped() {
        assert_eq!(CallbackEvent::parse("rating_6_981"), None);
        assert_eq!(CallbackEvent::parse("mark_-1_12"), None);
    }

    #[test]
    fn malformed_payloads_are_dropped() {
        assert_eq!(CallbackEvent::parse(""), None);
        assert_eq!(CallbackEvent::parse("share_"), None);
        assert_eq!(CallbackEvent::parse("share_abc"), None);
        assert_eq!(CallbackEvent::parse("rating_4"), None);
        assert_eq!(CallbackEvent::parse("unknown_5"), None);
        assert_eq!(CallbackEvent::parse("definitely not a tag"), None);
    }

    #[test]
    fn tags_round_trip_through_parse() {
        let events = [
            CallbackEvent::Menu,
            CallbackEvent::ShareToGroup(9),
            CallbackEvent::Rating {
                score: 5,
                music_id: 1234,
            },
            CallbackEvent::GroupHistoryCarousel(2),
        ];
        for event in events {
            assert_eq!(CallbackEvent::parse(&event.tag()), Some(event));
        }
    }
}
