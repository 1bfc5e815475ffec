//! Network lifecycle events consumed from the session stream, plus the
//! predicate that tells a navigation apart from ordinary resource traffic.

use std::collections::HashMap;

use navwatch_core_types::{FrameId, LoaderId, RequestId, ResourceType};
use serde::{Deserialize, Serialize};

/// `Network.requestWillBeSent` as observed on the session stream.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RequestWillBeSent {
    pub request_id: RequestId,
    pub loader_id: LoaderId,
    pub frame_id: FrameId,
    pub resource_type: ResourceType,
    pub url: String,
}

/// `Network.responseReceived` for a request the session knows about.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResponseReceived {
    pub request_id: RequestId,
    pub status: i64,
    pub headers: HashMap<String, String>,
}

/// `Network.loadingFailed`, carrying the protocol's error text.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoadingFailed {
    pub request_id: RequestId,
    pub error_text: String,
}

/// Payload carried on the session event bus.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum NetworkEvent {
    RequestWillBeSent(RequestWillBeSent),
    ResponseReceived(ResponseReceived),
    LoadingFailed(LoadingFailed),
}

/// True iff the event represents a top-level document navigation: the
/// request is its own loader and carries the `Document` resource type.
/// Sub-resources (images, scripts, fetches) share the frame's loader id
/// without equalling it.
pub fn is_navigation_request(event: &RequestWillBeSent) -> bool {
    event.request_id.0 == event.loader_id.0 && event.resource_type.is_document()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: &str, loader: &str, resource_type: ResourceType) -> RequestWillBeSent {
        RequestWillBeSent {
            request_id: RequestId(id.to_string()),
            loader_id: LoaderId(loader.to_string()),
            frame_id: FrameId("frame".to_string()),
            resource_type,
            url: "http://example.test/".to_string(),
        }
    }

    #[test]
    fn document_request_that_is_its_own_loader_is_a_navigation() {
        assert!(is_navigation_request(&request(
            "1",
            "1",
            ResourceType::Document
        )));
    }

    #[test]
    fn sub_resource_loader_mismatch_is_not_a_navigation() {
        assert!(!is_navigation_request(&request(
            "2",
            "1",
            ResourceType::Document
        )));
    }

    #[test]
    fn non_document_resource_is_not_a_navigation() {
        assert!(!is_navigation_request(&request(
            "1",
            "1",
            ResourceType::Script
        )));
        assert!(!is_navigation_request(&request("1", "1", ResourceType::Xhr)));
    }

    #[test]
    fn predicate_is_pure() {
        let event = request("1", "1", ResourceType::Document);
        let first = is_navigation_request(&event);
        for _ in 0..8 {
            assert_eq!(is_navigation_request(&event), first);
        }
    }
}
