use tracing::debug;

use super::Control;
use crate::state::{
    ids::{Member, UserId},
    player::{NOT_PLAYING_ANYTHING, PlayerAction},
    track::format_duration,
};

/// Longest history or queue listing.
const LISTING_LIMIT: usize = 10;

impl Control {
    /// Reaction on the now-playing surface.
    pub(super) async fn player_reaction(&mut self, emoji: &str, user: &Member) {
        let Some(action) = PlayerAction::from_emoji(emoji) else {
            return;
        };
        debug!(user_id = %user.id, ?action, "player reaction");
        let mention = user.id.mention();

        if action.controls_transport() {
            if let Some(refusal) = self.voice_refusal(user) {
                self.notify(&format!("{mention} {refusal}")).await;
                return;
            }
        }

        match action {
            PlayerAction::Previous => self.player.previous().await,
            PlayerAction::Pause => self.player.pause().await,
            PlayerAction::Resume => self.player.resume().await,
            PlayerAction::Skip => self.player.skip().await,
            PlayerAction::Stop => self.player.stop().await,
            PlayerAction::Restart => self.player.restart().await,
            PlayerAction::Shuffle => {
                self.player.shuffle();
                self.notify(&format!("{mention} Shuffled queue.")).await;
            }
            PlayerAction::RemoveFromPlaylist => self.offer_current_track(user.id, false).await,
            PlayerAction::AddToPlaylist => self.offer_current_track(user.id, true).await,
            PlayerAction::Info => self.show_info(user.id).await,
            PlayerAction::History => self.show_history(user.id).await,
            PlayerAction::Queue => self.show_queue(user.id).await,
        }
    }

    fn voice_refusal(&self, user: &Member) -> Option<&'static str> {
        let Some(bound) = self.player.voice_channel() else {
            return Some("Nothing is playing.");
        };
        match user.voice_channel_id {
            None => Some("You are not in a voice channel."),
            Some(channel) if channel != bound => Some("You are not in the same voice channel as me."),
            Some(_) => None,
        }
    }

    async fn show_info(&mut self, author: UserId) {
        let Some(track) = self.player.current_track() else {
            self.notify(&format!("{} {NOT_PLAYING_ANYTHING}", author.mention()))
                .await;
            return;
        };
        let text = format!(
            "**Title : ** {}\n**Author : ** {}\n**Duration : ** {}",
            track.title,
            track.author,
            format_duration(track.length())
        );
        self.notify(&text).await;
    }

    /// Last played titles, most recent first.
    pub(super) async fn show_history(&mut self, author: UserId) {
        let history = self.player.history_tracks();
        if history.is_empty() {
            self.notify(&format!("{} No past songs to show.", author.mention()))
                .await;
            return;
        }
        let text = history
            .iter()
            .rev()
            .take(LISTING_LIMIT)
            .map(|track| track.title.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        self.notify(&text).await;
    }

    /// Next queued titles.
    pub(super) async fn show_queue(&mut self, author: UserId) {
        let queued = self.player.queued_tracks();
        if queued.is_empty() {
            self.notify(&format!("{} No songs queued.", author.mention()))
                .await;
            return;
        }
        let text = queued
            .iter()
            .take(LISTING_LIMIT)
            .map(|track| track.title.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        self.notify(&text).await;
    }
}
