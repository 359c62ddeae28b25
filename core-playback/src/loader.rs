//! Track loading seam between the arbitrator and storage.

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use core_storage::LocatorResolver;

/// Produces the complete audio bytes for a locator.
#[async_trait]
pub trait TrackLoader: Send + Sync {
    async fn load_track(&self, source: &str) -> Result<Bytes>;
}

#[async_trait]
impl TrackLoader for LocatorResolver {
    async fn load_track(&self, source: &str) -> Result<Bytes> {
        Ok(self.load(source).await?)
    }
}
