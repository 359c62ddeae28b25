//! # Playback Module
//!
//! Decides which requested track becomes the audible one.
//!
//! ## Overview
//!
//! This module handles:
//! - Loading track bytes through a [`TrackLoader`] (the locator resolver)
//! - Arbitrating overlapping play requests so only the newest one plays
//! - Forwarding player lifecycle events onto the core event bus
//!
//! Decoding and audio output stay with the host behind
//! [`PlayerFactory`](bridge_traits::playback::PlayerFactory).

pub mod arbitrator;
pub mod error;
pub mod loader;

pub use arbitrator::{ArbiterState, PlayOutcome, PlaybackArbitrator, RequestId};
pub use error::{PlaybackError, Result};
pub use loader::TrackLoader;
