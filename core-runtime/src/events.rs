//! # Event Bus System
//!
//! Outward notifications of the library core, delivered over
//! `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The host UI never calls back into the core to learn about results. Every
//! command outcome (an uploaded song, a page of search results, an exported
//! catalog URL) and every playback notification (duration, progress, end)
//! is published as a [`CoreEvent`] that any number of subscribers observe
//! independently.
//!
//! ```text
//! ┌──────────────┐    emit     ┌───────────┐   subscribe   ┌────────────┐
//! │ LibraryService├───────────>│           ├──────────────>│  Host UI   │
//! └──────────────┘             │ EventBus  │               └────────────┘
//! ┌──────────────┐    emit     │           │   subscribe   ┌────────────┐
//! │  Arbitrator  ├────────────>│           ├──────────────>│   Logger   │
//! └──────────────┘             └───────────┘               └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(100);
//! let mut subscriber = bus.subscribe();
//!
//! bus.emit(CoreEvent::Playback(PlaybackEvent::Progress { position_ms: 1_000 }))
//!     .ok();
//!
//! let event = subscriber.recv().await.unwrap();
//! assert_eq!(event.description(), "Playback progress");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber fell behind by `n` events.
//!   Non-fatal; keep receiving.
//! - **`RecvError::Closed`**: every sender is gone. Treat as shutdown.
//!
//! `emit` fails only when nobody is subscribed; publishers ignore that case.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that can't keep up will receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Catalog and command-result events
    Library(LibraryEvent),
    /// Playback notifications
    Playback(PlaybackEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Library(e) => e.description(),
            CoreEvent::Playback(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Library(LibraryEvent::UploadFailed { .. })
            | CoreEvent::Library(LibraryEvent::CommandFailed { .. })
            | CoreEvent::Playback(PlaybackEvent::Error { .. }) => EventSeverity::Error,
            CoreEvent::Library(LibraryEvent::ImportCompleted { rejected, .. }) if *rejected > 0 => {
                EventSeverity::Warning
            }
            CoreEvent::Library(LibraryEvent::UploadCompleted { .. })
            | CoreEvent::Library(LibraryEvent::ImportCompleted { .. })
            | CoreEvent::Library(LibraryEvent::CatalogExported { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Song as presented to subscribers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SongSummary {
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Lowercase hex SHA-256 of the plaintext audio
    pub content_hash: String,
    /// `plain:` or `encrypted:` locator, including the key fragment
    pub locator: String,
}

// ============================================================================
// Library Events
// ============================================================================

/// Results of library commands.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LibraryEvent {
    /// A set of songs the UI should display (upload result, search page).
    SongsUpdated {
        songs: Vec<SongSummary>,
        /// Page index for search results, `None` for ad-hoc lists.
        page: Option<usize>,
    },
    /// A file was ingested successfully.
    UploadCompleted { song: SongSummary },
    /// A file could not be ingested.
    UploadFailed { message: String },
    /// A catalog snapshot was merged into the library.
    ImportCompleted {
        added: usize,
        duplicates: usize,
        rejected: usize,
    },
    /// The catalog was written to the object store.
    CatalogExported { locator: String },
    /// Any other command failed.
    CommandFailed { command: String, message: String },
}

impl LibraryEvent {
    fn description(&self) -> &str {
        match self {
            LibraryEvent::SongsUpdated { .. } => "Songs updated",
            LibraryEvent::UploadCompleted { .. } => "Song uploaded",
            LibraryEvent::UploadFailed { .. } => "Song upload failed",
            LibraryEvent::ImportCompleted { .. } => "Catalog imported",
            LibraryEvent::CatalogExported { .. } => "Catalog exported",
            LibraryEvent::CommandFailed { .. } => "Command failed",
        }
    }
}

// ============================================================================
// Playback Events
// ============================================================================

/// Notifications about the active player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// A track finished loading and became the active player.
    Started {
        /// Sequence number of the play request that won.
        request_id: u64,
        /// Whether the player was started or only preloaded.
        playing: bool,
    },
    /// The decoder reported the track duration.
    DurationDecoded { duration_ms: u64 },
    /// Current position of the active player.
    Progress { position_ms: u64 },
    /// The active player reached the end of the track.
    Ended,
    /// Loading or decoding the requested track failed.
    Error {
        message: String,
        /// Whether retrying the same request may succeed.
        recoverable: bool,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::Started { .. } => "Playback started",
            PlaybackEvent::DurationDecoded { .. } => "Duration decoded",
            PlaybackEvent::Progress { .. } => "Playback progress",
            PlaybackEvent::Ended => "Track ended",
            PlaybackEvent::Error { .. } => "Playback error",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Cloning the bus yields another producer for the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering up to `capacity` events per
    /// subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    ///
    /// ```rust
    /// use core_runtime::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.subscriber_count(), 0);
    ///
    /// let _subscriber = event_bus.subscribe();
    /// assert_eq!(event_bus.subscriber_count(), 1);
    /// ```
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` with an optional filter.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let event_bus = EventBus::new(100);
/// let playback_only = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Playback(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events that match `predicate` will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
