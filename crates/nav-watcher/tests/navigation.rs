use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use nav_watcher::{
    LoadingFailed, NavigationWatcher, NetworkEvent, RequestWillBeSent, ResponseReceived,
    WatchError,
};
use navwatch_core_types::{FrameId, LoaderId, RequestId, ResourceType};
use navwatch_event_bus::{EventBus, InMemoryBus};

fn document_request(id: &str, frame: &FrameId, url: &str) -> NetworkEvent {
    NetworkEvent::RequestWillBeSent(RequestWillBeSent {
        request_id: RequestId(id.to_string()),
        loader_id: LoaderId(id.to_string()),
        frame_id: frame.clone(),
        resource_type: ResourceType::Document,
        url: url.to_string(),
    })
}

fn sub_resource(id: &str, loader: &str, frame: &FrameId) -> NetworkEvent {
    NetworkEvent::RequestWillBeSent(RequestWillBeSent {
        request_id: RequestId(id.to_string()),
        loader_id: LoaderId(loader.to_string()),
        frame_id: frame.clone(),
        resource_type: ResourceType::Script,
        url: "http://example.test/app.js".to_string(),
    })
}

fn response(id: &str, status: i64) -> NetworkEvent {
    let mut headers = HashMap::new();
    headers.insert("content-type".to_string(), "text/html".to_string());
    NetworkEvent::ResponseReceived(ResponseReceived {
        request_id: RequestId(id.to_string()),
        status,
        headers,
    })
}

fn load_failed(id: &str, error_text: &str) -> NetworkEvent {
    NetworkEvent::LoadingFailed(LoadingFailed {
        request_id: RequestId(id.to_string()),
        error_text: error_text.to_string(),
    })
}

async fn publish_all(bus: &Arc<InMemoryBus<NetworkEvent>>, events: Vec<NetworkEvent>) {
    for event in events {
        bus.publish(event).await.expect("publish event");
    }
}

#[tokio::test]
async fn single_navigation_returns_the_response() {
    let bus = InMemoryBus::new(32);
    let frame = FrameId::new();
    let watcher = NavigationWatcher::attach(bus.as_ref(), frame.clone(), Duration::from_secs(5));

    publish_all(
        &bus,
        vec![
            document_request("1", &frame, "http://a.test/"),
            response("1", 200),
        ],
    )
    .await;

    let result = watcher.await_result().await.expect("navigation response");
    assert_eq!(result.status, 200);
    assert_eq!(
        result.headers.get("content-type").map(String::as_str),
        Some("text/html")
    );
}

#[tokio::test]
async fn redirect_supersedes_and_first_response_is_ignored() {
    let bus = InMemoryBus::new(32);
    let frame = FrameId::new();
    let watcher = NavigationWatcher::attach(bus.as_ref(), frame.clone(), Duration::from_secs(5));

    publish_all(
        &bus,
        vec![
            document_request("1", &frame, "http://a.test/"),
            document_request("2", &frame, "http://a.test/landing"),
            // Late terminal event for the superseded request.
            response("1", 301),
            response("2", 200),
        ],
    )
    .await;

    let result = watcher.await_result().await.expect("navigation response");
    assert_eq!(result.status, 200);
}

#[tokio::test]
async fn superseded_request_alone_cannot_resolve() {
    let bus = InMemoryBus::new(32);
    let frame = FrameId::new();
    let watcher =
        NavigationWatcher::attach(bus.as_ref(), frame.clone(), Duration::from_millis(100));

    publish_all(
        &bus,
        vec![
            document_request("1", &frame, "http://a.test/"),
            document_request("2", &frame, "http://a.test/landing"),
            response("1", 200),
        ],
    )
    .await;

    let err = watcher.await_result().await.expect_err("must time out");
    assert!(matches!(err, WatchError::NavigationTimeout));
}

#[tokio::test]
async fn events_from_other_frames_never_participate() {
    let bus = InMemoryBus::new(32);
    let target = FrameId::new();
    let other = FrameId::new();
    let watcher = NavigationWatcher::attach(bus.as_ref(), target.clone(), Duration::from_secs(5));

    publish_all(
        &bus,
        vec![
            document_request("9", &other, "http://g.test/"),
            document_request("2", &target, "http://f.test/"),
            response("2", 200),
        ],
    )
    .await;

    let result = watcher.await_result().await.expect("navigation response");
    assert_eq!(result.status, 200);
}

#[tokio::test]
async fn sub_resources_are_not_tracked() {
    let bus = InMemoryBus::new(32);
    let frame = FrameId::new();
    let watcher =
        NavigationWatcher::attach(bus.as_ref(), frame.clone(), Duration::from_millis(100));

    publish_all(
        &bus,
        vec![
            sub_resource("7", "1", &frame),
            response("7", 200),
        ],
    )
    .await;

    let err = watcher.await_result().await.expect_err("must time out");
    assert!(matches!(err, WatchError::NavigationTimeout));
}

#[tokio::test]
async fn loading_failed_carries_reason_and_tracked_url() {
    let bus = InMemoryBus::new(32);
    let frame = FrameId::new();
    let watcher = NavigationWatcher::attach(bus.as_ref(), frame.clone(), Duration::from_secs(5));

    publish_all(
        &bus,
        vec![
            document_request("1", &frame, "http://b.test/"),
            load_failed("1", "net::ERR_FAILED"),
        ],
    )
    .await;

    let err = watcher.await_result().await.expect_err("must fail");
    match err {
        WatchError::LoadingFailed { reason, url } => {
            assert_eq!(reason, "net::ERR_FAILED");
            assert_eq!(url, "http://b.test/");
        }
        other => panic!("expected LoadingFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn timeout_fires_within_bounds_when_nothing_arrives() {
    let bus: Arc<InMemoryBus<NetworkEvent>> = InMemoryBus::new(32);
    let frame = FrameId::new();
    let watcher =
        NavigationWatcher::attach(bus.as_ref(), frame.clone(), Duration::from_millis(100));

    let started = Instant::now();
    let err = watcher.await_result().await.expect_err("must time out");
    let elapsed = started.elapsed();

    assert!(matches!(err, WatchError::NavigationTimeout));
    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed < Duration::from_secs(5));
}

#[tokio::test]
async fn terminal_events_before_tracking_are_ignored() {
    let bus = InMemoryBus::new(32);
    let frame = FrameId::new();
    let watcher =
        NavigationWatcher::attach(bus.as_ref(), frame.clone(), Duration::from_millis(100));

    publish_all(
        &bus,
        vec![response("1", 200), load_failed("2", "net::ERR_ABORTED")],
    )
    .await;

    let err = watcher.await_result().await.expect_err("must time out");
    assert!(matches!(err, WatchError::NavigationTimeout));
}

#[tokio::test]
async fn failure_for_a_superseded_request_is_ignored() {
    let bus = InMemoryBus::new(32);
    let frame = FrameId::new();
    let watcher = NavigationWatcher::attach(bus.as_ref(), frame.clone(), Duration::from_secs(5));

    publish_all(
        &bus,
        vec![
            document_request("1", &frame, "http://a.test/"),
            document_request("2", &frame, "http://a.test/next"),
            load_failed("1", "net::ERR_ABORTED"),
            response("2", 204),
        ],
    )
    .await;

    let result = watcher.await_result().await.expect("navigation response");
    assert_eq!(result.status, 204);
}
