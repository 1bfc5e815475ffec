//! Identifier newtypes and protocol vocabulary shared across the navwatch crates.
//!
//! Identifiers are carried as the opaque strings the protocol reports; the
//! uuid-backed constructors exist for tests and in-memory wiring.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Network request identifier as reported on the session event stream.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Loader identifier; equals the request id for top-level document requests.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct LoaderId(pub String);

impl LoaderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for LoaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a browsing context (main page or embedded sub-frame).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct FrameId(pub String);

impl FrameId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resource type attached to a network request (CDP `Network.ResourceType`
/// subset). `Document` is the only value the navigation logic branches on;
/// the rest exist so real streams deserialize without loss.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ResourceType {
    Document,
    Stylesheet,
    Image,
    Media,
    Font,
    Script,
    #[serde(rename = "XHR")]
    Xhr,
    Fetch,
    WebSocket,
    Other,
}

impl ResourceType {
    pub fn is_document(self) -> bool {
        matches!(self, ResourceType::Document)
    }
}
