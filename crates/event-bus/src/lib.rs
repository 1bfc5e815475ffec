//! In-memory event bus delivering one session's push notifications to any
//! number of observers, in arrival order, on a single logical dispatch
//! sequence.
//!
//! `subscribe` hands back an explicit [`Subscription`] handle; holding the
//! handle keeps the registration alive and dropping it releases the slot
//! deterministically, so observer lifetime never hides inside a closure.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::warn;

/// Trait implemented by payload types that can be carried on the bus.
pub trait Event: Clone + Send + Sync + std::fmt::Debug + 'static {}

impl<T> Event for T where T: Clone + Send + Sync + std::fmt::Debug + 'static {}

/// Errors emitted by the bus surface.
#[derive(Clone, Debug, Error)]
pub enum BusError {
    #[error("no active subscribers")]
    NoSubscribers,
}

#[async_trait]
pub trait EventBus<E>: Send + Sync
where
    E: Event,
{
    /// Publish an event to every live subscription. Returns how many
    /// subscribers will observe it.
    async fn publish(&self, event: E) -> Result<usize, BusError>;

    /// Register a new observer at the current position of the stream.
    fn subscribe(&self) -> Subscription<E>;
}

/// Handle owning one observer registration.
///
/// Events published after `subscribe` are delivered through [`next`] in
/// arrival order. Dropping the handle unregisters the observer.
///
/// [`next`]: Subscription::next
pub struct Subscription<E>
where
    E: Event,
{
    rx: broadcast::Receiver<E>,
}

impl<E> Subscription<E>
where
    E: Event,
{
    /// Await the next event. Returns `None` once the bus has shut down.
    ///
    /// A subscriber that falls behind the bus capacity skips the missed
    /// events and keeps receiving from the oldest retained one.
    pub async fn next(&mut self) -> Option<E> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(target: "event-bus", skipped, "subscriber lagged; events skipped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Simple in-memory bus suitable for unit tests and single-process wiring.
pub struct InMemoryBus<E>
where
    E: Event,
{
    sender: broadcast::Sender<E>,
}

impl<E> InMemoryBus<E>
where
    E: Event,
{
    pub fn new(capacity: usize) -> Arc<Self> {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Arc::new(Self { sender })
    }
}

#[async_trait]
impl<E> EventBus<E> for InMemoryBus<E>
where
    E: Event,
{
    async fn publish(&self, event: E) -> Result<usize, BusError> {
        self.sender.send(event).map_err(|_| BusError::NoSubscribers)
    }

    fn subscribe(&self) -> Subscription<E> {
        Subscription {
            rx: self.sender.subscribe(),
        }
    }
}
