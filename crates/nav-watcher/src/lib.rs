//! Per-navigation completion watching over a CDP-style session event stream.
//!
//! A [`NavigationWatcher`] subscribes to the three network lifecycle events a
//! session emits (`requestWillBeSent`, `responseReceived`, `loadingFailed`),
//! correlates them against the top-level document request of one target
//! frame, follows redirect chains by superseding the tracked request, and
//! delivers exactly one outcome to the task awaiting it: the response, a
//! loading failure, or a timeout.
//!
//! The watcher observes; it never retries and never cancels browser-side
//! loading. A timed-out navigation may keep loading in the background.

pub mod events;
pub mod gate;
pub mod page;
pub mod watcher;

pub use events::{
    is_navigation_request, LoadingFailed, NetworkEvent, RequestWillBeSent, ResponseReceived,
};
pub use gate::{CompletionGate, GateWait};
pub use page::{NavigateDriver, Page, PageError};
pub use watcher::{
    NavigationRequest, NavigationResponse, NavigationResult, NavigationWatcher, WatchError,
    DEFAULT_NAVIGATION_TIMEOUT,
};
