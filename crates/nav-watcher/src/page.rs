//! The owner side of a navigation attempt: issue the command, await the
//! watcher.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use navwatch_core_types::FrameId;
use navwatch_event_bus::EventBus;
use thiserror::Error;
use tracing::info;

use crate::events::NetworkEvent;
use crate::watcher::{NavigationResponse, NavigationWatcher, WatchError, DEFAULT_NAVIGATION_TIMEOUT};

/// Errors surfaced by [`Page::goto`].
#[derive(Clone, Debug, Error)]
pub enum PageError {
    #[error("navigate command failed: {0}")]
    Driver(String),
    #[error(transparent)]
    Watch(#[from] WatchError),
}

/// Command side of a browser session. Implementations only issue the
/// navigation; observing its outcome is the watcher's job.
#[async_trait]
pub trait NavigateDriver: Send + Sync {
    async fn navigate(&self, frame: &FrameId, url: &str) -> Result<(), PageError>;
}

/// Owns one target frame and runs navigation attempts against it.
///
/// Every attempt gets a fresh [`NavigationWatcher`] with private state;
/// retry policy, if any, belongs to the caller. A timed-out attempt is an
/// observation timeout only — the browser may keep loading in the
/// background.
pub struct Page<D, B>
where
    D: NavigateDriver,
    B: EventBus<NetworkEvent>,
{
    driver: D,
    bus: Arc<B>,
    main_frame: FrameId,
    timeout: Duration,
}

impl<D, B> Page<D, B>
where
    D: NavigateDriver,
    B: EventBus<NetworkEvent>,
{
    pub fn new(driver: D, bus: Arc<B>, main_frame: FrameId) -> Self {
        Self {
            driver,
            bus,
            main_frame,
            timeout: DEFAULT_NAVIGATION_TIMEOUT,
        }
    }

    /// Override the per-attempt navigation deadline (default 30 s).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn main_frame(&self) -> &FrameId {
        &self.main_frame
    }

    /// Navigate the main frame and wait for the top-level document response.
    pub async fn goto(&self, url: &str) -> Result<NavigationResponse, PageError> {
        // Subscribe before issuing the command so no event can be missed.
        let watcher =
            NavigationWatcher::attach(self.bus.as_ref(), self.main_frame.clone(), self.timeout);
        self.driver.navigate(&self.main_frame, url).await?;
        info!(target: "nav-watcher", url, frame = %self.main_frame, "navigation issued");
        Ok(watcher.await_result().await?)
    }
}
