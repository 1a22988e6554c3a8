//! Playback queue: an ordered track list plus a cursor splitting it into
//! history, current track and queued tracks.

use rand::{rng, seq::SliceRandom};

use crate::state::track::Track;

/// Ordered sequence of tracks with a playback cursor.
///
/// A cursor of `-1` means nothing has started yet. The cursor is never clamped
/// by [`Queue::jump`]; every read clamps instead so a stray offset degrades to
/// "nothing current" rather than a panic.
#[derive(Debug, Clone)]
pub struct Queue {
    tracks: Vec<Track>,
    index: isize,
}

impl Default for Queue {
    fn default() -> Self {
        Self {
            tracks: Vec::new(),
            index: -1,
        }
    }
}

impl Queue {
    /// Create an empty queue with the cursor before the first track.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a track at the end of the queue.
    ///
    /// Returns `false` when there was nothing to append.
    pub fn append(&mut self, track: Option<Track>) -> bool {
        match track {
            Some(track) => {
                self.tracks.push(track);
                true
            }
            None => false,
        }
    }

    /// Move the cursor one step forward and return the new current track.
    pub fn advance(&mut self) -> Option<&Track> {
        self.index += 1;
        self.current_track()
    }

    /// Track under the cursor, if any.
    pub fn current_track(&self) -> Option<&Track> {
        usize::try_from(self.index)
            .ok()
            .and_then(|index| self.tracks.get(index))
    }

    /// Tracks played before the current one, oldest first.
    pub fn history_tracks(&self) -> &[Track] {
        &self.tracks[..self.clamped(self.index)]
    }

    /// Tracks waiting after the current one (everything before playback started).
    pub fn queued_tracks(&self) -> &[Track] {
        &self.tracks[self.queued_start()..]
    }

    /// Whether anything is waiting after the cursor.
    pub fn has_queued(&self) -> bool {
        !self.queued_tracks().is_empty()
    }

    /// Move the cursor by `offset` without bounds checks.
    pub fn jump(&mut self, offset: isize) {
        self.index += offset;
    }

    /// Shuffle the queued tracks, leaving history and the current track in place.
    pub fn shuffle(&mut self) {
        let start = self.queued_start();
        self.tracks[start..].shuffle(&mut rng());
    }

    /// Drop every track and rewind the cursor.
    pub fn reset(&mut self) {
        self.tracks.clear();
        self.index = -1;
    }

    /// Every track in queue order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    fn queued_start(&self) -> usize {
        if self.index < 0 {
            0
        } else {
            self.clamped(self.index + 1)
        }
    }

    fn clamped(&self, position: isize) -> usize {
        usize::try_from(position).unwrap_or(0).min(self.tracks.len())
    }
}
