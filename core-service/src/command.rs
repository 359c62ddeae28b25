//! Outward commands accepted by [`LibraryService::dispatch`](crate::LibraryService::dispatch).

use bytes::Bytes;
use std::fmt;

/// One request from the host UI.
#[derive(Clone, PartialEq, Eq)]
pub enum Command {
    /// Ingest an audio file.
    Upload { data: Bytes },
    /// Text search, or a stored locator to fetch and ingest.
    Search { query: String, page: usize },
    /// Load a song and make it the active player.
    Play { url: String, play_now: bool },
    Pause,
    Resume,
    /// Merge a catalog snapshot into the library.
    Import { url: String },
    /// Save the current catalog as a snapshot.
    Export,
}

impl Command {
    /// Channel name the desktop shell uses for this command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Upload { .. } => "player-upload",
            Command::Search { .. } => "player-search",
            Command::Play { .. } => "player-url",
            Command::Pause => "player-pause",
            Command::Resume => "player-play",
            Command::Import { .. } => "player-import",
            Command::Export => "player-export",
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Upload { data } => f
                .debug_struct("Upload")
                .field("len", &data.len())
                .finish(),
            Command::Search { query, page } => f
                .debug_struct("Search")
                .field("query", &core_runtime::logging::redact_locator(query))
                .field("page", page)
                .finish(),
            Command::Play { url, play_now } => f
                .debug_struct("Play")
                .field("url", &core_runtime::logging::redact_locator(url))
                .field("play_now", play_now)
                .finish(),
            Command::Pause => f.write_str("Pause"),
            Command::Resume => f.write_str("Resume"),
            Command::Import { url } => f
                .debug_struct("Import")
                .field("url", &core_runtime::logging::redact_locator(url))
                .finish(),
            Command::Export => f.write_str("Export"),
        }
    }
}
