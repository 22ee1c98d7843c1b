//! Channel directory abstraction and optional snapshot cache.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

use crate::models::{Channel, ChannelDetails};
use crate::Result;

/// Source of the channels a caption can be matched against.
///
/// The Slack implementation lives in [`crate::slack::client::SlackService`];
/// tests use in-memory implementations.
pub trait ChannelDirectory: Send + Sync {
    /// List known channels in platform order.
    ///
    /// Implementations fetch a bounded number of entries; channels beyond
    /// the bound are invisible to name matching.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Directory`](crate::AppError::Directory) when the
    /// listing call fails.
    fn list_channels(&self) -> Pin<Box<dyn Future<Output = Result<Vec<Channel>>> + Send + '_>>;

    /// Look up descriptive details for a single channel.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Directory`](crate::AppError::Directory) when the
    /// lookup fails.
    fn describe(
        &self,
        channel_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<ChannelDetails>> + Send + '_>>;
}

/// Wraps a directory and reuses its listing for a fixed time-to-live.
///
/// Failed listings are never cached, so the next event retries the
/// underlying directory.
pub struct CachedDirectory {
    inner: Arc<dyn ChannelDirectory>,
    ttl: Duration,
    snapshot: RwLock<Option<Snapshot>>,
}

struct Snapshot {
    fetched_at: Instant,
    channels: Arc<Vec<Channel>>,
}

impl CachedDirectory {
    /// Cache listings from `inner` for `ttl`.
    #[must_use]
    pub fn new(inner: Arc<dyn ChannelDirectory>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            snapshot: RwLock::new(None),
        }
    }

    /// Drop the cached listing so the next call hits the inner directory.
    pub async fn invalidate(&self) {
        *self.snapshot.write().await = None;
    }

    async fn fresh_snapshot(&self) -> Option<Arc<Vec<Channel>>> {
        let guard = self.snapshot.read().await;
        let fresh = guard
            .as_ref()
            .filter(|snap| snap.fetched_at.elapsed() < self.ttl)
            .map(|snap| Arc::clone(&snap.channels));
        fresh
    }
}

impl ChannelDirectory for CachedDirectory {
    fn list_channels(&self) -> Pin<Box<dyn Future<Output = Result<Vec<Channel>>> + Send + '_>> {
        Box::pin(async move {
            if let Some(channels) = self.fresh_snapshot().await {
                debug!(count = channels.len(), "channel directory cache hit");
                return Ok(channels.as_ref().clone());
            }

            let channels = self.inner.list_channels().await?;
            let mut guard = self.snapshot.write().await;
            *guard = Some(Snapshot {
                fetched_at: Instant::now(),
                channels: Arc::new(channels.clone()),
            });
            debug!(count = channels.len(), "channel directory cache refreshed");
            Ok(channels)
        })
    }

    fn describe(
        &self,
        channel_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<ChannelDetails>> + Send + '_>> {
        self.inner.describe(channel_id)
    }
}
