//! Workspace placeholder crate.
//!
//! This crate exposes feature flags that map onto the individual workspace
//! crates (`core-service`, `core-metadata`, `core-playback`). Host
//! applications can depend on `tunes-workspace` and enable the documented
//! features without wiring each crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_service::{bootstrap_desktop, DesktopBootstrap};

#[cfg(any(feature = "desktop-shims", feature = "tag-reader", feature = "playback", feature = "ipfs"))]
pub use core_service::{Command, CoreError, ImportSummary, LibraryService};

#[cfg(feature = "tag-reader")]
pub use core_metadata::LoftyTagReader;

#[cfg(feature = "playback")]
pub use core_playback::{ArbiterState, PlayOutcome};
