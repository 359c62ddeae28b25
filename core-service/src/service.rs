//! # Library Service
//!
//! The façade the host talks to. It owns the catalog, the active search
//! pager, the locator resolver and the playback arbitrator, and publishes
//! every outcome on the shared [`EventBus`].
//!
//! ## Overview
//!
//! A `LibraryService` is built once from a [`CoreConfig`] and handed around
//! by cloning; clones share the same state.
//!
//! ```ignore
//! let service = LibraryService::new(config)?;
//! let mut events = service.subscribe();
//!
//! let song = service.add_file(bytes).await?;
//! service.play(&song.locator.to_string(), true).await?;
//! ```
//!
//! Lock order is search before catalog. Neither lock is held while the
//! resolver or the arbitrator awaits.

use crate::command::Command;
use crate::error::{CoreError, Result};
use bytes::Bytes;
use core_library::{snapshot, Catalog, SearchPager, SongRecord};
use core_playback::{ArbiterState, PlayOutcome, PlaybackArbitrator};
use core_runtime::config::{BlobScheme, CoreConfig};
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent, Receiver, SongSummary};
use core_runtime::logging::redact_locator;
use core_storage::{Locator, LocatorResolver};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

/// Counts reported by [`LibraryService::import`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Records that were new to the catalog.
    pub added: usize,
    /// Records whose content hash was already present.
    pub duplicates: usize,
    /// Snapshot entries that failed to decode or validate.
    pub rejected: usize,
}

/// The last text search and the catalog size its pages were built from.
struct ActiveSearch {
    pager: SearchPager,
    catalog_len: usize,
}

/// Handle to the music library core.
#[derive(Clone)]
pub struct LibraryService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    config: CoreConfig,
    resolver: Arc<LocatorResolver>,
    catalog: RwLock<Catalog>,
    search: Mutex<Option<ActiveSearch>>,
    arbitrator: PlaybackArbitrator,
    event_bus: EventBus,
}

impl LibraryService {
    /// Build a service from a validated configuration.
    pub fn new(config: CoreConfig) -> Result<Self> {
        config.validate()?;

        let event_bus = EventBus::new(config.event_buffer_size);
        let resolver = Arc::new(LocatorResolver::from_config(&config));
        let arbitrator = PlaybackArbitrator::new(
            resolver.clone(),
            config.player_factory.clone(),
            event_bus.clone(),
        );

        info!(
            page_size = config.page_size,
            export_scheme = config.export_scheme.as_str(),
            tag_reader = config.tag_reader.is_some(),
            player_factory = config.player_factory.is_some(),
            "Library service initialized"
        );

        Ok(Self {
            inner: Arc::new(ServiceInner {
                config,
                resolver,
                catalog: RwLock::new(Catalog::new()),
                search: Mutex::new(None),
                arbitrator,
                event_bus,
            }),
        })
    }

    /// Receive every event published from now on.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.inner.event_bus.subscribe()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.inner.event_bus
    }

    pub fn config(&self) -> &CoreConfig {
        &self.inner.config
    }

    /// The resolver backing this service, shared with the arbitrator.
    pub fn resolver(&self) -> Arc<LocatorResolver> {
        self.inner.resolver.clone()
    }

    // ------------------------------------------------------------------
    // Ingestion
    // ------------------------------------------------------------------

    /// Ingest an audio file and add it to the catalog.
    ///
    /// The plaintext is read for tags, stored encrypted, and recorded under
    /// its content hash. Uploading the same bytes twice returns the record
    /// that was cataloged first.
    ///
    /// # Errors
    ///
    /// - [`CoreError::CapabilityMissing`] without a tag reader
    /// - [`CoreError::UnreadableAudio`] when the tag reader rejects the buffer
    /// - [`CoreError::InvalidMetadata`] when the tags carry no title
    /// - any storage error from saving the blob
    ///
    /// Nothing is added to the catalog on error.
    pub async fn add_file(&self, data: Bytes) -> Result<SongRecord> {
        let song = self.ingest(data).await?;
        self.publish_songs(vec![song.clone()], None);
        Ok(song)
    }

    #[instrument(skip(self, data), fields(len = data.len()))]
    async fn ingest(&self, data: Bytes) -> Result<SongRecord> {
        let reader = self.inner.config.tag_reader.clone().ok_or_else(|| {
            CoreError::CapabilityMissing {
                capability: "TagReader".to_string(),
                message: "No tag reader configured; uploads are unavailable".to_string(),
            }
        })?;

        let metadata = reader
            .read_metadata(data.clone())
            .await
            .map_err(|e| CoreError::UnreadableAudio(e.to_string()))?;

        let title = metadata
            .title
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| CoreError::InvalidMetadata("Audio file has no title tag".to_string()))?;

        let saved = self.inner.resolver.save(BlobScheme::Encrypted, data).await?;

        let record = SongRecord::new(
            title,
            metadata.artist.unwrap_or_default(),
            metadata.album.unwrap_or_default(),
            saved.hash,
            saved.locator,
        )?;

        let stored = {
            let mut catalog = self.inner.catalog.write().await;
            if catalog.load_song(record.clone()) {
                record
            } else {
                debug!(hash = %record.content_hash, "Song already cataloged");
                catalog
                    .get(&record.content_hash)
                    .cloned()
                    .unwrap_or(record)
            }
        };
        self.inner
            .resolver
            .remember(&stored.content_hash, &stored.locator);

        info!(
            title = %stored.title,
            hash = %stored.content_hash,
            locator = %stored.locator.redacted(),
            "Song ingested"
        );

        Ok(stored)
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    /// Return page `page` of the songs matching `query`.
    ///
    /// Repeating the last query continues its pager while the catalog is
    /// unchanged; any insertion starts a fresh scan. A query that is itself a `plain:` or `encrypted:`
    /// locator fetches that blob, ingests it, and returns the single song.
    pub async fn search(&self, query: &str, page: usize) -> Result<Vec<SongRecord>> {
        let trimmed = query.trim();

        if let Ok(locator) = Locator::parse(trimmed) {
            if locator.is_stored() {
                debug!(locator = %locator.redacted(), "Search by locator");
                let data = self.inner.resolver.load_locator(&locator).await?;
                let song = self.ingest(data).await?;
                self.publish_songs(vec![song.clone()], None);
                return Ok(vec![song]);
            }
        }

        let songs = {
            let mut active = self.inner.search.lock().await;
            let catalog = self.inner.catalog.read().await;
            if active
                .as_ref()
                .is_some_and(|s| s.pager.query() != query || s.catalog_len != catalog.len())
            {
                *active = None;
            }
            let search = active.get_or_insert_with(|| {
                debug!(query, songs = catalog.len(), "Starting new search");
                ActiveSearch {
                    pager: SearchPager::new(query, self.inner.config.page_size),
                    catalog_len: catalog.len(),
                }
            });
            search.pager.page(&catalog, page)
        };

        debug!(query, page, results = songs.len(), "Search page served");
        self.publish_songs(songs.clone(), Some(page));
        Ok(songs)
    }

    // ------------------------------------------------------------------
    // Playback
    // ------------------------------------------------------------------

    /// Load `url` and make it the active player.
    pub async fn play(&self, url: &str, play_now: bool) -> Result<PlayOutcome> {
        Ok(self.inner.arbitrator.request_play(url, play_now).await?)
    }

    pub fn pause(&self) {
        self.inner.arbitrator.pause();
    }

    pub fn resume(&self) {
        self.inner.arbitrator.resume();
    }

    pub fn playback_state(&self) -> ArbiterState {
        self.inner.arbitrator.state()
    }

    pub fn arbitrator(&self) -> &PlaybackArbitrator {
        &self.inner.arbitrator
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Merge the snapshot stored at `url` into the catalog.
    ///
    /// Any locator the resolver can load works, including `http(s)`.
    /// Entries that fail validation are skipped and counted.
    pub async fn import(&self, url: &str) -> Result<ImportSummary> {
        let data = self.inner.resolver.load(url).await?;
        let decoded = snapshot::decode(&data)?;

        let mut summary = ImportSummary {
            rejected: decoded.rejected,
            ..ImportSummary::default()
        };

        {
            let mut catalog = self.inner.catalog.write().await;
            for record in decoded.records {
                self.inner
                    .resolver
                    .remember(&record.content_hash, &record.locator);
                if catalog.load_song(record) {
                    summary.added += 1;
                } else {
                    summary.duplicates += 1;
                }
            }
        }

        info!(
            source = %redact_locator(url),
            added = summary.added,
            duplicates = summary.duplicates,
            rejected = summary.rejected,
            "Catalog imported"
        );

        let _ = self
            .inner
            .event_bus
            .emit(CoreEvent::Library(LibraryEvent::ImportCompleted {
                added: summary.added,
                duplicates: summary.duplicates,
                rejected: summary.rejected,
            }));

        Ok(summary)
    }

    /// Save the catalog as a snapshot using the configured export scheme.
    pub async fn export(&self) -> Result<Locator> {
        let records = self.inner.catalog.read().await.snapshot();
        let encoded = snapshot::encode(&records)?;

        let saved = self
            .inner
            .resolver
            .save(self.inner.config.export_scheme, encoded)
            .await?;

        info!(
            songs = records.len(),
            locator = %saved.locator.redacted(),
            "Catalog exported"
        );

        let _ = self
            .inner
            .event_bus
            .emit(CoreEvent::Library(LibraryEvent::CatalogExported {
                locator: saved.locator.to_string(),
            }));

        Ok(saved.locator)
    }

    /// Number of cataloged songs.
    pub async fn song_count(&self) -> usize {
        self.inner.catalog.read().await.len()
    }

    /// All cataloged songs in insertion order.
    pub async fn songs(&self) -> Vec<SongRecord> {
        self.inner.catalog.read().await.snapshot()
    }

    // ------------------------------------------------------------------
    // Command dispatch
    // ------------------------------------------------------------------

    /// Run one host command and publish its outcome on the event bus.
    ///
    /// Failures are published as well as returned. Playback failures are
    /// reported by the arbitrator's own events.
    #[instrument(skip(self, command), fields(command = command.name()))]
    pub async fn dispatch(&self, command: Command) -> Result<()> {
        let name = command.name();

        let result = match command {
            Command::Upload { data } => match self.add_file(data).await {
                Ok(song) => {
                    let _ = self
                        .inner
                        .event_bus
                        .emit(CoreEvent::Library(LibraryEvent::UploadCompleted {
                            song: SongSummary::from(&song),
                        }));
                    Ok(())
                }
                Err(e) => {
                    warn!(error = %e, "Upload failed");
                    let _ = self
                        .inner
                        .event_bus
                        .emit(CoreEvent::Library(LibraryEvent::UploadFailed {
                            message: e.to_string(),
                        }));
                    return Err(e);
                }
            },
            Command::Search { query, page } => self.search(&query, page).await.map(|_| ()),
            Command::Play { url, play_now } => {
                return self.play(&url, play_now).await.map(|_| ());
            }
            Command::Pause => {
                self.pause();
                Ok(())
            }
            Command::Resume => {
                self.resume();
                Ok(())
            }
            Command::Import { url } => self.import(&url).await.map(|_| ()),
            Command::Export => self.export().await.map(|_| ()),
        };

        if let Err(e) = &result {
            warn!(error = %e, "Command failed");
            let _ = self
                .inner
                .event_bus
                .emit(CoreEvent::Library(LibraryEvent::CommandFailed {
                    command: name.to_string(),
                    message: e.to_string(),
                }));
        }

        result
    }

    fn publish_songs(&self, songs: Vec<SongRecord>, page: Option<usize>) {
        let songs = songs.iter().map(SongSummary::from).collect();
        let _ = self
            .inner
            .event_bus
            .emit(CoreEvent::Library(LibraryEvent::SongsUpdated { songs, page }));
    }
}

impl std::fmt::Debug for LibraryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryService")
            .field("config", &self.inner.config)
            .field("playback", &self.inner.arbitrator.state())
            .finish()
    }
}
