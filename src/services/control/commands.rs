/// Entries of the fixed command menu, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Search for a song and queue it.
    Search,
    /// Queue every song of a playlist.
    PlayPlaylist,
    /// Create a playlist.
    CreatePlaylist,
    /// Delete a playlist.
    DeletePlaylist,
    /// Rename a playlist.
    RenamePlaylist,
    /// Add the current song to a playlist.
    AddSongToPlaylist,
    /// Remove the current song from a playlist.
    RemoveSongFromPlaylist,
    /// List upcoming songs.
    ShowQueue,
    /// List played songs.
    ShowHistory,
}

impl Command {
    /// Every command, in menu order.
    pub const ALL: [Command; 9] = [
        Command::Search,
        Command::PlayPlaylist,
        Command::CreatePlaylist,
        Command::DeletePlaylist,
        Command::RenamePlaylist,
        Command::AddSongToPlaylist,
        Command::RemoveSongFromPlaylist,
        Command::ShowQueue,
        Command::ShowHistory,
    ];

    /// Menu label.
    pub fn description(&self) -> &'static str {
        match self {
            Command::Search => "Search for a Song.",
            Command::PlayPlaylist => "Play Playlist.",
            Command::CreatePlaylist => "Create a Playlist.",
            Command::DeletePlaylist => "Delete a Playlist.",
            Command::RenamePlaylist => "Rename Playlist.",
            Command::AddSongToPlaylist => "Add current Song to Playlist.",
            Command::RemoveSongFromPlaylist => "Remove current Song from Playlist.",
            Command::ShowQueue => "Show Queue.",
            Command::ShowHistory => "Show History.",
        }
    }

    /// Command at a menu index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Labels of the whole menu.
    pub fn menu() -> Vec<String> {
        Self::ALL
            .iter()
            .map(|command| command.description().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_order_is_stable() {
        assert_eq!(Command::from_index(0), Some(Command::Search));
        assert_eq!(Command::from_index(2), Some(Command::CreatePlaylist));
        assert_eq!(Command::from_index(8), Some(Command::ShowHistory));
        assert_eq!(Command::from_index(9), None);
        assert_eq!(Command::menu()[4], "Rename Playlist.");
    }
}
