//! The per-navigation state machine.
//!
//! One watcher instance covers one navigation attempt for one target frame.
//! It moves `Idle -> Tracking -> Resolved`, supersedes the tracked request
//! when the browser re-issues the top-level document request (redirects),
//! and produces exactly one terminal result.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use navwatch_core_types::{FrameId, LoaderId, RequestId, ResourceType};
use navwatch_event_bus::{EventBus, Subscription};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::events::{
    is_navigation_request, LoadingFailed, NetworkEvent, RequestWillBeSent, ResponseReceived,
};
use crate::gate::{CompletionGate, GateWait};

/// Default deadline for awaiting a navigation outcome.
pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// The top-level document request currently treated as "the" navigation.
/// Replaced wholesale when a newer qualifying request arrives.
#[derive(Clone, Debug)]
pub struct NavigationRequest {
    pub request_id: RequestId,
    pub loader_id: LoaderId,
    pub frame_id: FrameId,
    pub resource_type: ResourceType,
    pub url: String,
}

impl From<&RequestWillBeSent> for NavigationRequest {
    fn from(event: &RequestWillBeSent) -> Self {
        Self {
            request_id: event.request_id.clone(),
            loader_id: event.loader_id.clone(),
            frame_id: event.frame_id.clone(),
            resource_type: event.resource_type,
            url: event.url.clone(),
        }
    }
}

/// Successful navigation outcome handed back to the owner.
#[derive(Clone, Debug)]
pub struct NavigationResponse {
    pub status: i64,
    pub headers: HashMap<String, String>,
}

/// Terminal classification of one navigation attempt. Immutable once stored.
#[derive(Clone, Debug)]
pub enum NavigationResult {
    Response(NavigationResponse),
    Failure { reason: String, url: String },
    TimedOut,
}

#[derive(Clone, Debug)]
enum WatchState {
    Idle,
    Tracking(NavigationRequest),
    Resolved(NavigationResult),
}

/// Errors surfaced by [`NavigationWatcher::await_result`]. Both are terminal;
/// retry policy belongs to the owner.
#[derive(Clone, Debug, Error)]
pub enum WatchError {
    #[error("navigation did not resolve before the deadline")]
    NavigationTimeout,
    #[error("failed to load {url}: {reason}")]
    LoadingFailed { reason: String, url: String },
}

struct WatcherShared {
    target_frame: FrameId,
    state: Mutex<WatchState>,
    gate: CompletionGate,
}

impl WatcherShared {
    fn apply(&self, event: &NetworkEvent) {
        match event {
            NetworkEvent::RequestWillBeSent(ev) => self.on_request(ev),
            NetworkEvent::ResponseReceived(ev) => self.on_response(ev),
            NetworkEvent::LoadingFailed(ev) => self.on_loading_failed(ev),
        }
    }

    fn on_request(&self, event: &RequestWillBeSent) {
        if !is_navigation_request(event) || event.frame_id != self.target_frame {
            return;
        }
        let mut state = self.state.lock();
        match &*state {
            // No mutation once a result exists.
            WatchState::Resolved(_) => return,
            WatchState::Tracking(previous) => {
                debug!(
                    target: "nav-watcher",
                    superseded = %previous.request_id,
                    by = %event.request_id,
                    url = %event.url,
                    "redirect superseded tracked request"
                );
            }
            WatchState::Idle => {
                debug!(
                    target: "nav-watcher",
                    request = %event.request_id,
                    url = %event.url,
                    "tracking navigation request"
                );
            }
        }
        *state = WatchState::Tracking(NavigationRequest::from(event));
        // A stale firing left over from a discarded request must not leak.
        self.gate.reset();
    }

    fn on_response(&self, event: &ResponseReceived) {
        let mut state = self.state.lock();
        let WatchState::Tracking(request) = &*state else {
            return;
        };
        if request.request_id != event.request_id {
            return;
        }
        debug!(
            target: "nav-watcher",
            request = %event.request_id,
            status = event.status,
            "navigation response received"
        );
        *state = WatchState::Resolved(NavigationResult::Response(NavigationResponse {
            status: event.status,
            headers: event.headers.clone(),
        }));
        self.gate.signal();
    }

    fn on_loading_failed(&self, event: &LoadingFailed) {
        let mut state = self.state.lock();
        let WatchState::Tracking(request) = &*state else {
            return;
        };
        if request.request_id != event.request_id {
            return;
        }
        debug!(
            target: "nav-watcher",
            request = %event.request_id,
            reason = %event.error_text,
            "navigation load failed"
        );
        let url = request.url.clone();
        *state = WatchState::Resolved(NavigationResult::Failure {
            reason: event.error_text.clone(),
            url,
        });
        self.gate.signal();
    }

    fn is_resolved(&self) -> bool {
        matches!(&*self.state.lock(), WatchState::Resolved(_))
    }
}

/// Correlates the session's network events into one navigation outcome.
///
/// Create a fresh watcher per navigation attempt, before issuing the
/// navigate command, so no event can be missed. Await the outcome with
/// [`await_result`], which consumes the watcher.
///
/// [`await_result`]: NavigationWatcher::await_result
pub struct NavigationWatcher {
    shared: Arc<WatcherShared>,
    timeout: Duration,
    pump: JoinHandle<()>,
}

impl NavigationWatcher {
    /// Subscribe to `bus` and start correlating events for `target_frame`.
    ///
    /// # Panics
    /// Panics when `timeout` is zero.
    pub fn attach<B>(bus: &B, target_frame: FrameId, timeout: Duration) -> Self
    where
        B: EventBus<NetworkEvent> + ?Sized,
    {
        assert!(!timeout.is_zero(), "navigation timeout must be positive");
        let shared = Arc::new(WatcherShared {
            target_frame,
            state: Mutex::new(WatchState::Idle),
            gate: CompletionGate::new(),
        });
        let subscription = bus.subscribe();
        let pump = tokio::spawn(Self::pump(Arc::clone(&shared), subscription));
        Self {
            shared,
            timeout,
            pump,
        }
    }

    async fn pump(shared: Arc<WatcherShared>, mut subscription: Subscription<NetworkEvent>) {
        while let Some(event) = subscription.next().await {
            shared.apply(&event);
            if shared.is_resolved() {
                // Release the subscription as soon as a result exists.
                break;
            }
        }
    }

    /// Suspend until the navigation resolves or the deadline elapses.
    ///
    /// Returns the stored response on success, [`WatchError::LoadingFailed`]
    /// when the protocol reported a failure for the tracked request, and
    /// [`WatchError::NavigationTimeout`] when no terminal event was observed
    /// in time (including the case where the navigation never started).
    pub async fn await_result(self) -> Result<NavigationResponse, WatchError> {
        let outcome = self.shared.gate.wait(self.timeout).await;
        self.pump.abort();
        let mut state = self.shared.state.lock();
        match outcome {
            GateWait::TimedOut => {
                // Seal the state so a late terminal event cannot mutate it
                // after the deadline has been consumed.
                *state = WatchState::Resolved(NavigationResult::TimedOut);
                self.shared.gate.signal();
                Err(WatchError::NavigationTimeout)
            }
            GateWait::Signaled => match &*state {
                WatchState::Resolved(NavigationResult::Response(response)) => Ok(response.clone()),
                WatchState::Resolved(NavigationResult::Failure { reason, url }) => {
                    Err(WatchError::LoadingFailed {
                        reason: reason.clone(),
                        url: url.clone(),
                    })
                }
                // The gate only fires after a result is stored; degrade an
                // unexpected state to a timeout rather than panic.
                _ => Err(WatchError::NavigationTimeout),
            },
        }
    }
}

impl Drop for NavigationWatcher {
    fn drop(&mut self) {
        // Releases the subscription when the owner abandons the watcher.
        self.pump.abort();
    }
}
