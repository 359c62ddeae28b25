//! Audio decoder bridge traits and supporting types.
//!
//! The core never decodes PCM itself. It asks a [`TagReader`] for the
//! metadata of an in-memory buffer and asks a [`PlayerFactory`] to turn a
//! buffer into a [`PlayerHandle`]. The player reports its lifecycle back over
//! a [`PlayerEventSender`] channel supplied at construction time.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::Result;

/// Supported audio codec identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioCodec {
    Mp3,
    Aac,
    Flac,
    Vorbis,
    Opus,
    Wav,
    Alac,
    /// Codec is unknown or not yet mapped to a dedicated variant.
    Unknown,
    /// Vendor- or platform-specific codec.
    Other(String),
}

/// Stream format reported by the decoder once it has parsed the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    /// Codec identifier associated with the source.
    pub codec: AudioCodec,
    /// Sample rate in hertz.
    pub sample_rate: u32,
    /// Number of audio channels.
    pub channels: u16,
    /// Average bitrate in kbps, when reported by the decoder.
    pub bitrate: Option<u32>,
}

impl AudioFormat {
    pub fn new(codec: AudioCodec, sample_rate: u32, channels: u16, bitrate: Option<u32>) -> Self {
        Self {
            codec,
            sample_rate,
            channels,
            bitrate,
        }
    }
}

/// Raw tag values read from an audio buffer.
///
/// Every field is optional here; deciding which ones are mandatory for a
/// catalog entry is the caller's job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
}

impl TrackMetadata {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }
}

/// Lifecycle notification emitted by a [`PlayerHandle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// Container parsed; stream format known.
    Format(AudioFormat),
    /// Total duration in milliseconds.
    Duration(u64),
    /// Decoding has started producing audio.
    DecodeStart,
    /// Current playback position in milliseconds.
    Progress(u64),
    /// Playback reached the end of the stream.
    End,
    /// The decoder or output device failed.
    Error(String),
}

/// Channel a player uses to report [`PlayerEvent`]s back to the core.
pub type PlayerEventSender = mpsc::UnboundedSender<PlayerEvent>;

/// Receiving half of a player event channel.
pub type PlayerEventReceiver = mpsc::UnboundedReceiver<PlayerEvent>;

/// Reads title/artist/album tags out of an in-memory audio buffer.
#[async_trait]
pub trait TagReader: Send + Sync {
    /// Parse the buffer and return whatever tags it carries.
    ///
    /// # Errors
    ///
    /// Returns an error when the buffer is not a decodable audio file.
    async fn read_metadata(&self, data: Bytes) -> Result<TrackMetadata>;
}

/// Controls on a single decoded track.
///
/// All methods are fire-and-forget: outcomes are reported through the
/// [`PlayerEventSender`] the handle was created with.
///
/// `play`, `pause` and `preload` are called while the playback arbitrator
/// holds its state lock. They must not call back into the arbitrator
/// synchronously; report through the event sender instead. `stop` is called
/// without the lock held.
pub trait PlayerHandle: Send + Sync {
    /// Begin or resume audible playback.
    fn play(&self);

    /// Pause without releasing the decoded stream.
    fn pause(&self);

    /// Decode ahead so that a later `play` starts immediately.
    fn preload(&self);

    /// Stop playback and release the output device.
    fn stop(&self);
}

/// Builds players for complete in-memory audio buffers.
pub trait PlayerFactory: Send + Sync {
    /// Create a player for `data` that reports its lifecycle on `events`.
    ///
    /// The player must not start producing sound until
    /// [`PlayerHandle::play`] is called.
    fn create_player(&self, data: Bytes, events: PlayerEventSender) -> Result<Box<dyn PlayerHandle>>;
}
