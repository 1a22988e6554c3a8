use std::{sync::Arc, time::Duration};

use super::*;
use crate::{
    dao::playlist_store::{StoreSlot, memory::InMemoryPlaylistStore},
    services::playlist_service::{
        PlaylistLimits,
        tests::{LIMITS, memory_service},
    },
    state::{
        ids::{Member, MessageId},
        selector::NUMBER_EMOJIS,
        track::sample_track,
    },
    transport::testing::{FakeTrackSource, RecordingUi, RecordingVoice, VoiceCall},
};

const CHANNEL: ChannelId = ChannelId(42);
const WAIT: Duration = Duration::from_secs(30);
const PLACEHOLDER: &str = "> Select a command above.";

fn alice() -> Member {
    Member::new(1, Some(ChannelId(500)))
}

fn bob() -> Member {
    Member::new(2, Some(ChannelId(500)))
}

struct Harness {
    control: Control,
    ui: Arc<RecordingUi>,
    voice: Arc<RecordingVoice>,
    tracks: Arc<FakeTrackSource>,
    playlists: PlaylistService,
    menu: SurfaceId,
    selector: SurfaceId,
    player: SurfaceId,
    next_message: u64,
}

impl Harness {
    async fn new() -> Self {
        Self::with_playlists(memory_service().await).await
    }

    async fn with_playlists(playlists: PlaylistService) -> Self {
        let ui = RecordingUi::new();
        let voice = RecordingVoice::new();
        let tracks = FakeTrackSource::new();
        let mut control = Control::new(
            CHANNEL,
            Collaborators {
                ui: ui.clone(),
                voice: voice.clone(),
                tracks: tracks.clone(),
                playlists: playlists.clone(),
            },
            ControlSettings {
                selection_wait_time: WAIT,
                selection_placeholder: PLACEHOLDER.into(),
            },
            Notifier::new(ui.clone()),
        );
        control.setup().await;
        let surfaces = ui.surfaces();
        Self {
            control,
            ui,
            voice,
            tracks,
            playlists,
            menu: surfaces[0],
            selector: surfaces[1],
            player: surfaces[2],
            next_message: 1,
        }
    }

    async fn react(&mut self, surface: SurfaceId, emoji: &str, user: &Member) {
        self.control
            .process_input(UserInput::Reaction {
                surface,
                emoji: emoji.to_string(),
                user: user.clone(),
            })
            .await;
    }

    async fn command(&mut self, command: Command, user: &Member) {
        let index = Command::ALL
            .iter()
            .position(|candidate| *candidate == command)
            .unwrap();
        self.react(self.menu, NUMBER_EMOJIS[index], user).await;
    }

    async fn pick(&mut self, index: usize, user: &Member) {
        self.react(self.selector, NUMBER_EMOJIS[index], user).await;
    }

    async fn say(&mut self, user: &Member, content: &str) -> MessageId {
        let id = MessageId(self.next_message);
        self.next_message += 1;
        self.control
            .process_input(UserInput::Message(ChatMessage {
                id,
                channel_id: CHANNEL,
                content: content.to_string(),
                author: user.clone(),
            }))
            .await;
        id
    }

    fn notice(&self) -> String {
        self.ui.last_notice().unwrap_or_default()
    }

    fn selector_content(&self) -> String {
        self.ui.content_of(self.selector).unwrap_or_default()
    }

    async fn play(&mut self, user: &Member, titles: &[&str]) {
        let tracks = titles.iter().map(|title| sample_track(title)).collect();
        self.tracks.with_search("query", tracks);
        for index in 0..titles.len() {
            self.command(Command::Search, user).await;
            self.say(user, "query").await;
            self.pick(index, user).await;
        }
    }
}

#[tokio::test]
async fn setup_renders_the_three_surfaces() {
    let harness = Harness::new().await;
    let menu = harness.ui.content_of(harness.menu).unwrap();
    assert!(menu.starts_with("1️⃣ - Search for a Song.\n2️⃣ - Play Playlist."));
    assert_eq!(harness.selector_content(), PLACEHOLDER);
    assert_eq!(
        harness.ui.content_of(harness.player).as_deref(),
        Some("Nothing playing.")
    );
    assert!(harness.control.owns_surface(harness.player));
    assert!(!harness.control.owns_surface(SurfaceId::new()));
}

#[tokio::test]
async fn input_before_setup_is_dropped() {
    let ui = RecordingUi::new();
    let mut control = Control::new(
        CHANNEL,
        Collaborators {
            ui: ui.clone(),
            voice: RecordingVoice::new(),
            tracks: FakeTrackSource::new(),
            playlists: memory_service().await,
        },
        ControlSettings {
            selection_wait_time: WAIT,
            selection_placeholder: PLACEHOLDER.into(),
        },
        Notifier::new(ui.clone()),
    );
    control
        .process_input(UserInput::Message(ChatMessage {
            id: MessageId(9),
            channel_id: CHANNEL,
            content: "hello".into(),
            author: alice(),
        }))
        .await;
    assert_eq!(ui.deleted_messages(), [MessageId(9)]);
    assert!(ui.surfaces().is_empty());
}

#[tokio::test]
async fn root_deletes_stray_messages_and_ignores_other_channels() {
    let mut harness = Harness::new().await;
    let id = harness.say(&alice(), "hi").await;
    assert_eq!(harness.ui.deleted_messages(), [id]);

    harness
        .control
        .process_input(UserInput::Message(ChatMessage {
            id: MessageId(77),
            channel_id: ChannelId(7),
            content: "elsewhere".into(),
            author: alice(),
        }))
        .await;
    assert_eq!(harness.ui.deleted_messages(), [id]);
    assert!(harness.control.requests.is_empty());
}

#[tokio::test]
async fn create_playlist_by_name() {
    let mut harness = Harness::new().await;
    harness.command(Command::CreatePlaylist, &alice()).await;
    assert_eq!(harness.notice(), "> <@1> What is the name of the playlist?\n");
    assert_eq!(
        harness.control.requests.state_of(UserId(1)),
        RequestState::AwaitingPlaylistNameForCreate
    );

    let id = harness.say(&alice(), "Road Trip").await;
    assert_eq!(harness.notice(), "> Created playlist **Road Trip**.\n");
    assert!(harness.ui.deleted_messages().contains(&id));
    assert!(harness.control.requests.is_empty());

    harness.command(Command::CreatePlaylist, &alice()).await;
    harness.say(&alice(), "Road Trip").await;
    assert_eq!(harness.notice(), "> Playlist **Road Trip** already exists.\n");
}

#[tokio::test]
async fn a_reaction_aborts_a_name_prompt() {
    let mut harness = Harness::new().await;
    harness.command(Command::CreatePlaylist, &alice()).await;
    let menu = harness.menu;
    harness.react(menu, NUMBER_EMOJIS[7], &alice()).await;
    // the abort is not re-dispatched, so the queue listing is not shown
    assert_eq!(harness.notice(), "> <@1> What is the name of the playlist?\n");
    assert!(harness.control.requests.is_empty());
}

#[tokio::test]
async fn playlist_commands_need_playlists() {
    let mut harness = Harness::new().await;
    harness.command(Command::DeletePlaylist, &alice()).await;
    assert_eq!(harness.notice(), "> <@1> You have no playlists.\n");
    assert!(harness.control.requests.is_empty());
    assert_eq!(harness.control.window.owner(), None);
}

#[tokio::test]
async fn delete_and_rename_through_the_selector() {
    let mut harness = Harness::new().await;
    for name in ["Road Trip", "Chill"] {
        harness.playlists.create_playlist(name, UserId(1)).await.unwrap();
    }

    harness.command(Command::RenamePlaylist, &alice()).await;
    assert_eq!(
        harness.selector_content(),
        "<@1> Select **Playlist** to rename:\n1️⃣ - Chill\n2️⃣ - Road Trip"
    );
    harness.pick(1, &alice()).await;
    assert_eq!(harness.notice(), "> <@1> What should **Road Trip** be renamed to?\n");
    assert_eq!(harness.selector_content(), PLACEHOLDER);
    assert_eq!(harness.control.window.owner(), None);

    harness.say(&alice(), "Summer").await;
    assert_eq!(
        harness.notice(),
        "> Renamed playlist from **Road Trip** to **Summer**.\n"
    );

    harness.command(Command::DeletePlaylist, &alice()).await;
    harness.pick(0, &alice()).await;
    assert_eq!(harness.notice(), "> Deleted playlist **Chill**.\n");
    let left = harness
        .playlists
        .list_playlists(UserId(1), None)
        .await
        .unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].name, "Summer");
    assert!(harness.control.requests.is_empty());
}

#[tokio::test(start_paused = true)]
async fn the_selector_belongs_to_one_user_until_the_window_expires() {
    let mut harness = Harness::new().await;
    harness.playlists.create_playlist("A-list", UserId(1)).await.unwrap();
    harness.playlists.create_playlist("B-list", UserId(2)).await.unwrap();

    harness.command(Command::DeletePlaylist, &alice()).await;
    let alice_view = harness.selector_content();
    assert_eq!(alice_view, "<@1> Select **Playlist** to delete:\n1️⃣ - A-list");

    tokio::time::advance(WAIT - Duration::from_secs(1)).await;
    harness.command(Command::DeletePlaylist, &bob()).await;
    assert_eq!(harness.selector_content(), alice_view);
    assert_eq!(harness.control.requests.state_of(UserId(2)), RequestState::Root);

    tokio::time::advance(Duration::from_secs(1)).await;
    harness.command(Command::DeletePlaylist, &bob()).await;
    assert_eq!(
        harness.selector_content(),
        "<@2> Select **Playlist** to delete:\n1️⃣ - B-list"
    );
    assert!(harness.control.window.is_owner(UserId(2)));

    // alice's stale click is a no-op that only drops her request
    harness.pick(0, &alice()).await;
    assert!(harness.control.requests.get(UserId(1)).is_none());
    assert_eq!(
        harness.playlists.list_playlists(UserId(1), None).await.unwrap().len(),
        1
    );

    harness.pick(0, &bob()).await;
    assert_eq!(harness.notice(), "> Deleted playlist **B-list**.\n");
}

#[tokio::test(start_paused = true)]
async fn the_owner_keeps_the_original_claim_time() {
    let mut harness = Harness::new().await;
    harness.playlists.create_playlist("B-list", UserId(2)).await.unwrap();
    harness.tracks.with_search("lofi", vec![sample_track("Rain")]);

    harness.command(Command::Search, &alice()).await;
    tokio::time::advance(Duration::from_secs(20)).await;
    // the results re-use the slot claimed by the search command
    harness.say(&alice(), "lofi").await;
    assert!(harness.selector_content().ends_with("1️⃣ - Rain"));
    tokio::time::advance(Duration::from_secs(10)).await;

    harness.command(Command::DeletePlaylist, &bob()).await;
    assert!(harness.control.window.is_owner(UserId(2)));
    assert_eq!(
        harness.selector_content(),
        "<@2> Select **Playlist** to delete:\n1️⃣ - B-list"
    );
}

#[tokio::test]
async fn the_command_menu_interrupts_a_selection() {
    let mut harness = Harness::new().await;
    harness.playlists.create_playlist("Mix", UserId(1)).await.unwrap();
    harness.command(Command::DeletePlaylist, &alice()).await;

    harness.command(Command::CreatePlaylist, &alice()).await;
    assert_eq!(harness.selector_content(), PLACEHOLDER);
    assert_eq!(harness.control.window.owner(), None);
    assert_eq!(
        harness.control.requests.state_of(UserId(1)),
        RequestState::AwaitingPlaylistNameForCreate
    );
}

#[tokio::test]
async fn paging_and_invalid_picks() {
    let slot = Arc::new(StoreSlot::new());
    slot.install(Arc::new(InMemoryPlaylistStore::default()))
        .await;
    let limits = PlaylistLimits {
        max_playlists: 20,
        ..LIMITS
    };
    let mut harness = Harness::with_playlists(PlaylistService::new(slot, limits)).await;
    for index in 0..12 {
        let response = harness
            .playlists
            .create_playlist(&format!("list {index:02}"), UserId(1))
            .await
            .unwrap();
        assert!(response.ok, "{}", response.message);
    }
    harness.command(Command::PlayPlaylist, &alice()).await;

    let selector = harness.selector;
    harness.react(selector, "➡️", &alice()).await;
    assert_eq!(
        harness.selector_content(),
        "<@1> Select **Playlist** to play:\n1️⃣ - list 10\n2️⃣ - list 11"
    );
    assert_eq!(
        harness.control.requests.state_of(UserId(1)),
        RequestState::AwaitingPlaylistSelectionForPlay
    );

    let id = harness.say(&alice(), "typing instead").await;
    assert!(harness.ui.deleted_messages().contains(&id));
    assert_eq!(
        harness.control.requests.state_of(UserId(1)),
        RequestState::AwaitingPlaylistSelectionForPlay
    );

    harness.pick(5, &alice()).await;
    assert_eq!(harness.notice(), "> <@1> Invalid selection.\n");
    assert_eq!(harness.selector_content(), PLACEHOLDER);
    assert!(harness.control.requests.is_empty());
}

#[tokio::test]
async fn search_then_pick_a_song() {
    let mut harness = Harness::new().await;
    harness
        .tracks
        .with_search("lofi", vec![sample_track("Rain"), sample_track("Snow")]);

    harness.command(Command::Search, &alice()).await;
    assert_eq!(harness.notice(), "> <@1> What song do you want to search for?\n");
    assert!(harness.control.window.is_owner(UserId(1)));

    harness.say(&alice(), "lofi").await;
    assert_eq!(
        harness.selector_content(),
        "<@1> Select **Song** to play:\n1️⃣ - Rain\n2️⃣ - Snow"
    );

    harness.pick(1, &alice()).await;
    assert_eq!(harness.notice(), "> <@1> Added song to queue.\n");
    assert_eq!(harness.voice.played(), ["Snow"]);
    assert_eq!(harness.selector_content(), PLACEHOLDER);
    assert!(harness.control.searched_tracks.is_empty());
    assert!(harness.control.requests.is_empty());
}

#[tokio::test]
async fn search_failures_return_to_the_menu() {
    let mut harness = Harness::new().await;
    harness.command(Command::Search, &alice()).await;
    harness.say(&alice(), "nothing like this").await;
    assert_eq!(
        harness.notice(),
        "> <@1> Did not find any songs that match your query.\n"
    );
    assert_eq!(harness.control.window.owner(), None);

    harness.tracks.fail();
    harness.command(Command::Search, &alice()).await;
    harness.say(&alice(), "anything").await;
    assert_eq!(harness.notice(), "> <@1> Search failed, try again later.\n");
    assert!(harness.control.requests.is_empty());
}

#[tokio::test]
async fn picking_a_song_needs_a_voice_channel() {
    let mut harness = Harness::new().await;
    harness.tracks.with_search("lofi", vec![sample_track("Rain")]);
    let listener = Member::new(3, None);
    harness.command(Command::Search, &listener).await;
    harness.say(&listener, "lofi").await;
    harness.pick(0, &listener).await;
    assert_eq!(harness.notice(), "> <@3> Join a voice channel.\n");
    assert!(harness.voice.played().is_empty());
}

#[tokio::test]
async fn current_song_round_trip_through_a_playlist() {
    let mut harness = Harness::new().await;
    harness.playlists.create_playlist("Mix", UserId(1)).await.unwrap();

    harness.command(Command::AddSongToPlaylist, &alice()).await;
    assert_eq!(harness.notice(), "> <@1> Not playing anything.\n");

    harness.play(&alice(), &["Rain"]).await;
    let player = harness.player;
    harness.react(player, "💿", &alice()).await;
    assert_eq!(
        harness.selector_content(),
        "<@1> Select **Playlist** to add song to:\n1️⃣ - Mix"
    );
    harness.pick(0, &alice()).await;
    assert_eq!(harness.notice(), "> Added song to **Mix**.\n");
    assert_eq!(
        harness.playlists.list_songs(UserId(1), "Mix").await.unwrap(),
        ["vid-Rain"]
    );

    harness.react(player, "⏹", &alice()).await;
    harness.command(Command::PlayPlaylist, &alice()).await;
    harness.pick(0, &alice()).await;
    assert_eq!(harness.notice(), "> <@1> Queued 1 songs from **Mix**.\n");
    assert_eq!(harness.voice.played(), ["Rain", "Rain"]);

    harness.command(Command::RemoveSongFromPlaylist, &alice()).await;
    harness.pick(0, &alice()).await;
    assert_eq!(harness.notice(), "> Deleted song from **Mix**.\n");
}

#[tokio::test]
async fn unavailable_playlist_songs_are_reported() {
    let mut harness = Harness::new().await;
    harness.playlists.create_playlist("Mix", UserId(1)).await.unwrap();
    harness.playlists.add_song(UserId(1), "Mix", "gone").await.unwrap();

    harness.command(Command::PlayPlaylist, &alice()).await;
    harness.pick(0, &alice()).await;
    assert_eq!(harness.notice(), "> <@1> Song video is unavailable: gone\n");
    assert!(harness.voice.played().is_empty());
}

#[tokio::test]
async fn transport_controls_check_the_voice_channel() {
    let mut harness = Harness::new().await;
    let player = harness.player;
    harness.react(player, "⏭", &alice()).await;
    assert_eq!(harness.notice(), "> <@1> Nothing is playing.\n");

    harness.play(&alice(), &["Rain", "Snow"]).await;
    harness.react(player, "⏭", &Member::new(3, None)).await;
    assert_eq!(harness.notice(), "> <@3> You are not in a voice channel.\n");
    harness
        .react(player, "⏭", &Member::new(3, Some(ChannelId(999))))
        .await;
    assert_eq!(
        harness.notice(),
        "> <@3> You are not in the same voice channel as me.\n"
    );
    assert!(!harness.voice.calls().contains(&VoiceCall::Stop));

    harness.react(player, "⏭", &bob()).await;
    assert_eq!(harness.voice.calls().last(), Some(&VoiceCall::Stop));
    harness.control.song_ended().await;
    assert_eq!(harness.voice.played(), ["Rain", "Snow"]);
}

#[tokio::test]
async fn listings_and_info() {
    let mut harness = Harness::new().await;
    let player = harness.player;
    harness.react(player, "🇭", &alice()).await;
    assert_eq!(harness.notice(), "> <@1> No past songs to show.\n");
    harness.command(Command::ShowQueue, &alice()).await;
    assert_eq!(harness.notice(), "> <@1> No songs queued.\n");

    harness.play(&alice(), &["a", "b", "c"]).await;
    harness.control.song_ended().await;
    harness.control.song_ended().await;

    harness.react(player, "🇭", &alice()).await;
    assert_eq!(harness.notice(), "> b\n> a\n");
    harness.react(player, "ℹ️", &Member::new(3, None)).await;
    assert_eq!(
        harness.notice(),
        "> **Title : ** c\n> **Author : ** someone\n> **Duration : ** 0:03:05\n"
    );
    harness.react(player, "🔀", &alice()).await;
    assert_eq!(harness.notice(), "> <@1> Shuffled queue.\n");
}

#[tokio::test]
async fn anyone_may_shuffle_without_joining_voice() {
    let mut harness = Harness::new().await;
    let titles = ["a", "b", "c", "d", "e", "f", "g", "h"];
    harness.play(&alice(), &titles).await;
    let queued = |harness: &Harness| -> Vec<String> {
        harness
            .control
            .player
            .queued_tracks()
            .iter()
            .map(|track| track.title.clone())
            .collect()
    };
    let mut before = queued(&harness);

    let player = harness.player;
    harness.react(player, "🔀", &Member::new(3, None)).await;
    assert_eq!(harness.notice(), "> <@3> Shuffled queue.\n");
    let mut after = queued(&harness);
    assert_eq!(harness.control.player.current_track().unwrap().title, "a");
    before.sort();
    after.sort();
    assert_eq!(before, after);
    assert_eq!(after, ["b", "c", "d", "e", "f", "g", "h"]);
}

#[tokio::test]
async fn storage_outage_is_reported() {
    let playlists = PlaylistService::new(Arc::new(StoreSlot::new()), LIMITS);
    let mut harness = Harness::with_playlists(playlists).await;
    harness.command(Command::PlayPlaylist, &alice()).await;
    assert_eq!(
        harness.notice(),
        "> <@1> Playlist storage is unavailable right now.\n"
    );
    assert!(harness.control.requests.is_empty());
}
