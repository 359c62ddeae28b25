//! # Playback Arbitrator
//!
//! Owns the single audible player and decides which of several overlapping
//! play requests gets to create it.
//!
//! ## States
//!
//! ```text
//!            request_play              load ok, still current
//!   Idle ──────────────────▶ Loading(R) ───────────────────────▶ Active(R)
//!    ▲                         │  ▲                                 │
//!    │   load failed (current) │  │ request_play (stops player)     │
//!    └─────────────────────────┘  └─────────────────────────────────┘
//!    ▲                                                               │
//!    └──────────────────────── end / player error ───────────────────┘
//! ```
//!
//! Every request gets a fresh, increasing [`RequestId`]. When a load
//! finishes, its bytes are used only if the arbitrator is still
//! `Loading` that same id; otherwise they are dropped and the request
//! reports [`PlayOutcome::Superseded`].
//!
//! `pause`/`resume` act on the player if one is active. While a load is in
//! flight they only flip the pending intent, which decides between `play`
//! and `preload` once the player exists.
//!
//! All state lives behind one `parking_lot::Mutex`, which is never held
//! across an `.await`. `create_player` and `stop` run outside the lock;
//! `play`, `preload` and `pause` run under it so transport calls reach the
//! player in order. A [`PlayerHandle`] must therefore not call back into the
//! arbitrator from those methods.
//!
//! Dropping a `request_play` future while it loads puts the arbitrator back
//! to `Idle` unless a newer request has already taken over.

use crate::error::{PlaybackError, Result};
use crate::loader::TrackLoader;
use bridge_traits::playback::{PlayerEvent, PlayerEventReceiver, PlayerFactory, PlayerHandle};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Sequence number of a play request.
pub type RequestId = u64;

/// Observable state of the arbitrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbiterState {
    Idle,
    Loading { request_id: RequestId },
    Active { request_id: RequestId, playing: bool },
}

/// How a play request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// This request's player is now the active one.
    Activated { request_id: RequestId, playing: bool },
    /// A newer request took over before this one finished loading.
    Superseded { request_id: RequestId },
}

enum Slot {
    Idle,
    Loading {
        request_id: RequestId,
        source: String,
    },
    Active {
        request_id: RequestId,
        source: String,
        player: Box<dyn PlayerHandle>,
        playing: bool,
    },
}

struct Inner {
    slot: Slot,
    pending_play_now: bool,
    last_request: RequestId,
}

impl Inner {
    fn is_loading(&self, id: RequestId) -> bool {
        matches!(self.slot, Slot::Loading { request_id, .. } if request_id == id)
    }

    fn is_active(&self, id: RequestId) -> bool {
        matches!(self.slot, Slot::Active { request_id, .. } if request_id == id)
    }

    /// Go `Idle`, handing back the active player for the caller to stop
    /// once the lock is released.
    fn take_player(&mut self) -> Option<Box<dyn PlayerHandle>> {
        match std::mem::replace(&mut self.slot, Slot::Idle) {
            Slot::Active { player, .. } => Some(player),
            _ => None,
        }
    }
}

/// Returns the arbitrator to `Idle` if its request is still loading when
/// dropped.
struct LoadingGuard<'a> {
    inner: &'a Mutex<Inner>,
    request_id: RequestId,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.inner.lock();
        if inner.is_loading(self.request_id) {
            debug!(request_id = self.request_id, "Play request abandoned while loading");
            inner.slot = Slot::Idle;
        }
    }
}

pub struct PlaybackArbitrator {
    loader: Arc<dyn TrackLoader>,
    factory: Option<Arc<dyn PlayerFactory>>,
    event_bus: EventBus,
    inner: Arc<Mutex<Inner>>,
}

impl PlaybackArbitrator {
    pub fn new(
        loader: Arc<dyn TrackLoader>,
        factory: Option<Arc<dyn PlayerFactory>>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            loader,
            factory,
            event_bus,
            inner: Arc::new(Mutex::new(Inner {
                slot: Slot::Idle,
                pending_play_now: false,
                last_request: 0,
            })),
        }
    }

    /// Load `source` and make it the active player.
    ///
    /// Any active player is stopped immediately. The returned outcome tells
    /// whether this request won or was overtaken by a newer one.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::AdapterNotInitialized`] without a player factory
    /// - the load or decode error, if this request was still current when
    ///   it failed (the arbitrator returns to `Idle`)
    pub async fn request_play(&self, source: &str, play_now: bool) -> Result<PlayOutcome> {
        let factory = self
            .factory
            .clone()
            .ok_or(PlaybackError::AdapterNotInitialized)?;

        let (request_id, previous) = {
            let mut inner = self.inner.lock();
            let previous = inner.take_player();
            inner.pending_play_now = play_now;
            inner.last_request += 1;
            let request_id = inner.last_request;
            inner.slot = Slot::Loading {
                request_id,
                source: source.to_string(),
            };
            (request_id, previous)
        };
        if let Some(previous) = previous {
            previous.stop();
        }
        debug!(request_id, play_now, "Loading track");

        let _guard = LoadingGuard {
            inner: &*self.inner,
            request_id,
        };

        let loaded = self.loader.load_track(source).await;

        let data = {
            let mut inner = self.inner.lock();
            if !inner.is_loading(request_id) {
                debug!(request_id, "Discarding superseded load");
                return Ok(PlayOutcome::Superseded { request_id });
            }
            match loaded {
                Ok(data) => data,
                Err(err) => {
                    inner.slot = Slot::Idle;
                    drop(inner);
                    self.report_failure(request_id, &err);
                    return Err(err);
                }
            }
        };

        let (tx, events) = mpsc::unbounded_channel();
        let created = factory.create_player(data, tx);

        let playing = {
            let mut inner = self.inner.lock();
            if !inner.is_loading(request_id) {
                drop(inner);
                debug!(request_id, "Superseded while creating player");
                if let Ok(player) = created {
                    player.stop();
                }
                return Ok(PlayOutcome::Superseded { request_id });
            }

            let player = match created {
                Ok(player) => player,
                Err(err) => {
                    inner.slot = Slot::Idle;
                    drop(inner);
                    let err = PlaybackError::from(err);
                    self.report_failure(request_id, &err);
                    return Err(err);
                }
            };

            let playing = inner.pending_play_now;
            if playing {
                player.play();
            } else {
                player.preload();
            }

            let source = match std::mem::replace(&mut inner.slot, Slot::Idle) {
                Slot::Loading { source, .. } => source,
                _ => source.to_string(),
            };
            inner.slot = Slot::Active {
                request_id,
                source,
                player,
                playing,
            };
            playing
        };

        self.spawn_forwarder(request_id, events);

        info!(request_id, playing, "Track became the active player");
        let _ = self
            .event_bus
            .emit(CoreEvent::Playback(PlaybackEvent::Started {
                request_id,
                playing,
            }));

        Ok(PlayOutcome::Activated {
            request_id,
            playing,
        })
    }

    /// Pause the active player, or cancel the intent to auto-play.
    pub fn pause(&self) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        match &mut inner.slot {
            Slot::Active {
                player, playing, ..
            } => {
                player.pause();
                *playing = false;
            }
            _ => {
                debug!("No active player; will not auto-play");
                inner.pending_play_now = false;
            }
        }
    }

    /// Resume the active player, or ask for auto-play once one exists.
    pub fn resume(&self) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        match &mut inner.slot {
            Slot::Active {
                player, playing, ..
            } => {
                player.play();
                *playing = true;
            }
            _ => {
                debug!("No active player; will play when ready");
                inner.pending_play_now = true;
            }
        }
    }

    pub fn state(&self) -> ArbiterState {
        match self.inner.lock().slot {
            Slot::Idle => ArbiterState::Idle,
            Slot::Loading { request_id, .. } => ArbiterState::Loading { request_id },
            Slot::Active {
                request_id,
                playing,
                ..
            } => ArbiterState::Active {
                request_id,
                playing,
            },
        }
    }

    /// Locator of the active player.
    pub fn active_source(&self) -> Option<String> {
        match &self.inner.lock().slot {
            Slot::Active { source, .. } => Some(source.clone()),
            _ => None,
        }
    }

    pub fn pending_play_now(&self) -> bool {
        self.inner.lock().pending_play_now
    }

    fn report_failure(&self, request_id: RequestId, err: &PlaybackError) {
        warn!(request_id, error = %err, "Play request failed");
        let _ = self
            .event_bus
            .emit(CoreEvent::Playback(PlaybackEvent::Error {
                message: err.to_string(),
                recoverable: err.is_transient(),
            }));
    }

    fn spawn_forwarder(&self, request_id: RequestId, mut events: PlayerEventReceiver) {
        let inner = Arc::clone(&self.inner);
        let event_bus = self.event_bus.clone();

        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if !forward_player_event(&inner, &event_bus, request_id, event) {
                    break;
                }
            }
            debug!(request_id, "Player event forwarder finished");
        });
    }
}

/// Apply one player event. Returns `false` once the player is no longer
/// current and forwarding should stop.
fn forward_player_event(
    inner: &Mutex<Inner>,
    event_bus: &EventBus,
    request_id: RequestId,
    event: PlayerEvent,
) -> bool {
    let mut released = None;
    let outgoing = {
        let mut inner = inner.lock();
        if !inner.is_active(request_id) {
            debug!(request_id, ?event, "Dropping event from stale player");
            return false;
        }

        match event {
            PlayerEvent::Format(format) => {
                debug!(request_id, ?format, "Format decoded");
                None
            }
            PlayerEvent::DecodeStart => {
                debug!(request_id, "Audio decode started");
                None
            }
            PlayerEvent::Duration(duration_ms) => {
                Some(PlaybackEvent::DurationDecoded { duration_ms })
            }
            PlayerEvent::Progress(position_ms) => Some(PlaybackEvent::Progress { position_ms }),
            PlayerEvent::End => {
                info!(request_id, "Track ended");
                inner.slot = Slot::Idle;
                Some(PlaybackEvent::Ended)
            }
            PlayerEvent::Error(message) => {
                warn!(request_id, %message, "Player reported an error");
                released = inner.take_player();
                Some(PlaybackEvent::Error {
                    message,
                    recoverable: false,
                })
            }
        }
    };

    if let Some(player) = released {
        player.stop();
    }

    let keep_going = !matches!(
        outgoing,
        Some(PlaybackEvent::Ended) | Some(PlaybackEvent::Error { .. })
    );
    if let Some(event) = outgoing {
        let _ = event_bus.emit(CoreEvent::Playback(event));
    }
    keep_going
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::playback::PlayerEventSender;
    use bytes::Bytes;

    struct StaticLoader(std::result::Result<&'static [u8], &'static str>);

    #[async_trait]
    impl TrackLoader for StaticLoader {
        async fn load_track(&self, _source: &str) -> Result<Bytes> {
            match self.0 {
                Ok(data) => Ok(Bytes::from_static(data)),
                Err(message) => Err(PlaybackError::TrackNotFound(message.to_string())),
            }
        }
    }

    #[derive(Default)]
    struct RecordingFactory {
        calls: Arc<Mutex<Vec<&'static str>>>,
        senders: Mutex<Vec<PlayerEventSender>>,
        reject: bool,
    }

    struct RecordingPlayer(Arc<Mutex<Vec<&'static str>>>);

    impl PlayerHandle for RecordingPlayer {
        fn play(&self) {
            self.0.lock().push("play");
        }
        fn pause(&self) {
            self.0.lock().push("pause");
        }
        fn preload(&self) {
            self.0.lock().push("preload");
        }
        fn stop(&self) {
            self.0.lock().push("stop");
        }
    }

    impl PlayerFactory for RecordingFactory {
        fn create_player(
            &self,
            _data: Bytes,
            events: PlayerEventSender,
        ) -> BridgeResult<Box<dyn PlayerHandle>> {
            if self.reject {
                return Err(BridgeError::OperationFailed("not audio".into()));
            }
            self.calls.lock().push("create");
            self.senders.lock().push(events);
            Ok(Box::new(RecordingPlayer(self.calls.clone())))
        }
    }

    fn arbitrator(
        loader: StaticLoader,
        factory: Arc<RecordingFactory>,
    ) -> PlaybackArbitrator {
        PlaybackArbitrator::new(Arc::new(loader), Some(factory), EventBus::new(16))
    }

    #[tokio::test]
    async fn test_play_now_starts_player() {
        let factory = Arc::new(RecordingFactory::default());
        let arb = arbitrator(StaticLoader(Ok(b"audio")), factory.clone());

        let outcome = arb.request_play("plain:a", true).await.unwrap();
        assert_eq!(
            outcome,
            PlayOutcome::Activated {
                request_id: 1,
                playing: true
            }
        );
        assert_eq!(*factory.calls.lock(), vec!["create", "play"]);
        assert_eq!(arb.active_source().as_deref(), Some("plain:a"));
    }

    #[tokio::test]
    async fn test_without_play_now_only_preloads() {
        let factory = Arc::new(RecordingFactory::default());
        let arb = arbitrator(StaticLoader(Ok(b"audio")), factory.clone());

        arb.request_play("plain:a", false).await.unwrap();
        assert_eq!(*factory.calls.lock(), vec!["create", "preload"]);
        assert_eq!(
            arb.state(),
            ArbiterState::Active {
                request_id: 1,
                playing: false
            }
        );
    }

    #[tokio::test]
    async fn test_new_request_stops_active_player_first() {
        let factory = Arc::new(RecordingFactory::default());
        let arb = arbitrator(StaticLoader(Ok(b"audio")), factory.clone());

        arb.request_play("plain:a", true).await.unwrap();
        arb.request_play("plain:b", true).await.unwrap();

        assert_eq!(
            *factory.calls.lock(),
            vec!["create", "play", "stop", "create", "play"]
        );
        assert_eq!(arb.active_source().as_deref(), Some("plain:b"));
    }

    #[tokio::test]
    async fn test_pause_and_resume_without_player_flip_intent() {
        let arb = arbitrator(
            StaticLoader(Ok(b"audio")),
            Arc::new(RecordingFactory::default()),
        );

        arb.resume();
        assert!(arb.pending_play_now());
        arb.pause();
        assert!(!arb.pending_play_now());
        assert_eq!(arb.state(), ArbiterState::Idle);
    }

    #[tokio::test]
    async fn test_pause_and_resume_drive_active_player() {
        let factory = Arc::new(RecordingFactory::default());
        let arb = arbitrator(StaticLoader(Ok(b"audio")), factory.clone());

        arb.request_play("plain:a", true).await.unwrap();
        arb.pause();
        assert!(matches!(arb.state(), ArbiterState::Active { playing: false, .. }));
        arb.resume();
        assert!(matches!(arb.state(), ArbiterState::Active { playing: true, .. }));

        assert_eq!(
            *factory.calls.lock(),
            vec!["create", "play", "pause", "play"]
        );
    }

    #[tokio::test]
    async fn test_load_failure_returns_to_idle_and_reports() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let arb = PlaybackArbitrator::new(
            Arc::new(StaticLoader(Err("gone"))),
            Some(Arc::new(RecordingFactory::default())),
            bus,
        );

        let err = arb.request_play("plain:a", true).await.unwrap_err();
        assert!(matches!(err, PlaybackError::TrackNotFound(_)));
        assert_eq!(arb.state(), ArbiterState::Idle);

        match rx.recv().await.unwrap() {
            CoreEvent::Playback(PlaybackEvent::Error { recoverable, .. }) => {
                assert!(!recoverable)
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_factory_rejection_is_a_decoding_error() {
        let factory = Arc::new(RecordingFactory {
            reject: true,
            ..Default::default()
        });
        let arb = arbitrator(StaticLoader(Ok(b"junk")), factory);

        let err = arb.request_play("plain:a", true).await.unwrap_err();
        assert!(matches!(err, PlaybackError::DecodingError(_)));
        assert_eq!(arb.state(), ArbiterState::Idle);
    }

    #[tokio::test]
    async fn test_missing_factory() {
        let arb = PlaybackArbitrator::new(
            Arc::new(StaticLoader(Ok(b"audio"))),
            None,
            EventBus::new(16),
        );
        let err = arb.request_play("plain:a", true).await.unwrap_err();
        assert!(matches!(err, PlaybackError::AdapterNotInitialized));
        assert_eq!(arb.state(), ArbiterState::Idle);
    }
}
