//! Resettable single-fire synchronization primitive bridging callback-driven
//! event arrivals and one blocking consumer.

use std::time::Duration;

use tokio::sync::watch;

/// Outcome of [`CompletionGate::wait`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GateWait {
    Signaled,
    TimedOut,
}

/// Manual-reset gate: `signal` latches it open (idempotent until a `reset`),
/// `reset` closes it again, `wait` suspends until the gate is open or the
/// deadline elapses. A signal that happened before `wait` was called
/// completes the wait immediately.
#[derive(Debug)]
pub struct CompletionGate {
    signaled: watch::Sender<bool>,
}

impl CompletionGate {
    pub fn new() -> Self {
        Self {
            signaled: watch::Sender::new(false),
        }
    }

    /// Latch the gate open. A second signal before a reset is a no-op.
    pub fn signal(&self) {
        self.signaled
            .send_if_modified(|flag| !std::mem::replace(flag, true));
    }

    /// Clear the signaled flag so a stale firing cannot leak through.
    pub fn reset(&self) {
        self.signaled
            .send_if_modified(|flag| std::mem::replace(flag, false));
    }

    pub fn is_signaled(&self) -> bool {
        *self.signaled.borrow()
    }

    /// Suspend the caller until the gate is signaled or `timeout` elapses.
    pub async fn wait(&self, timeout: Duration) -> GateWait {
        let mut rx = self.signaled.subscribe();
        let outcome = match tokio::time::timeout(timeout, rx.wait_for(|flag| *flag)).await {
            Ok(Ok(_)) => GateWait::Signaled,
            // The sender lives as long as `self`, so a closed channel only
            // occurs if the gate is dropped mid-wait.
            Ok(Err(_)) | Err(_) => GateWait::TimedOut,
        };
        outcome
    }
}

impl Default for CompletionGate {
    fn default() -> Self {
        Self::new()
    }
}
