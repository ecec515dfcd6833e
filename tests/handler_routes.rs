//! HTTP-level tests of the handler router.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use eventmesh_publisher::cloudevents::{EventMeshBuilder, EventResolver};
use eventmesh_publisher::cluster::memory::MemoryInformer;
use eventmesh_publisher::cluster::{wait_for_cache_sync, ApplicationLister};
use eventmesh_publisher::config::Options;
use eventmesh_publisher::eventtype::{Cleaner, EventMeshCleaner};
use eventmesh_publisher::handler::Handler;
use eventmesh_publisher::health::Checker;
use eventmesh_publisher::legacy::LegacyTransformer;
use eventmesh_publisher::lifecycle::LifecycleContext;
use eventmesh_publisher::observability::Collector;
use eventmesh_publisher::receiver::HttpMessageReceiver;
use eventmesh_publisher::subscribed::Processor;

mod common;
use common::{subscription, RecordingSender, NAMESPACE, PREFIX};

async fn handler(sender: Arc<RecordingSender>, options: Options) -> Handler {
    let informer = MemoryInformer::synced(vec![subscription(
        "orders",
        &["sap.kyma.custom.commerce.order.created.v1"],
    )]);
    let synced = wait_for_cache_sync(&informer, Duration::from_secs(1), &LifecycleContext::new())
        .await
        .unwrap();

    let builder = EventMeshBuilder::new(
        PREFIX,
        NAMESPACE,
        Arc::new(EventMeshCleaner::new()),
        ApplicationLister::Absent,
    );
    Handler {
        receiver: HttpMessageReceiver::new(0),
        sender,
        health: Arc::new(Checker::new()),
        request_timeout: Duration::from_secs(2),
        legacy: Arc::new(LegacyTransformer::new(NAMESPACE, PREFIX, ApplicationLister::Absent)),
        options,
        subscribed: Arc::new(Processor::new(synced, PREFIX)),
        resolver: Arc::new(EventResolver::new(
            PREFIX,
            NAMESPACE,
            Arc::new(Cleaner::new(PREFIX, ApplicationLister::Absent)),
            builder,
        )),
        collector: Collector::new(),
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn structured(body: serde_json::Value) -> Request<Body> {
    Request::post("/publish")
        .header("content-type", "application/cloudevents+json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_publish_structured_event() {
    let sender = Arc::new(RecordingSender::new(204));
    let router = handler(sender.clone(), Options::default()).await.router();

    let response = router
        .oneshot(structured(serde_json::json!({
            "id": "1",
            "source": "my-app",
            "specversion": "1.0",
            "type": "Order-Item.created.v1"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let events = sender.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "sap.kyma.custom.myapp.OrderItem.created.v1");
    assert_eq!(events[0].source, NAMESPACE);
}

#[tokio::test]
async fn test_publish_binary_event() {
    let sender = Arc::new(RecordingSender::new(204));
    let router = handler(sender.clone(), Options::default()).await.router();

    let request = Request::post("/publish")
        .header("content-type", "application/json")
        .header("ce-specversion", "1.0")
        .header("ce-id", "1")
        .header("ce-source", "kyma")
        .header("ce-type", "order.created.v1")
        .body(Body::from(r#"{"orderId":1}"#))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(sender.events()[0].event_type, "sap.kyma.custom.kyma.order.created.v1");
}

#[tokio::test]
async fn test_publish_rejects_bad_type() {
    let sender = Arc::new(RecordingSender::new(204));
    let router = handler(sender.clone(), Options::default()).await.router();

    let response = router
        .oneshot(structured(serde_json::json!({
            "id": "1",
            "source": "kyma",
            "specversion": "1.0",
            "type": "created"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(sender.events().is_empty());
}

#[tokio::test]
async fn test_publish_passes_backend_rejection_through() {
    let sender = Arc::new(RecordingSender::new(429));
    let router = handler(sender, Options::default()).await.router();

    let response = router
        .oneshot(structured(serde_json::json!({
            "id": "1",
            "source": "kyma",
            "specversion": "1.0",
            "type": "order.created.v1"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_publish_enforces_body_limit() {
    let sender = Arc::new(RecordingSender::new(204));
    let options = Options {
        max_request_size: 64,
        ..Options::default()
    };
    let router = handler(sender.clone(), options).await.router();

    let response = router
        .oneshot(structured(serde_json::json!({
            "id": "1",
            "source": "kyma",
            "specversion": "1.0",
            "type": "order.created.v1",
            "data": "x".repeat(256)
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(sender.events().is_empty());
}

#[tokio::test]
async fn test_legacy_publish() {
    let sender = Arc::new(RecordingSender::new(204));
    let router = handler(sender.clone(), Options::default()).await.router();

    let request = Request::post("/my-app/v1/events")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({
                "event-type": "order.created",
                "event-type-version": "v1",
                "event-time": "2024-01-02T03:04:05Z",
                "data": {"orderId": 1}
            })
            .to_string(),
        ))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let event = &sender.events()[0];
    assert_eq!(body["event-id"], event.id.as_str());
    assert_eq!(body["status"], 200);
    assert_eq!(event.event_type, "sap.kyma.custom.myapp.order.created.v1");
}

#[tokio::test]
async fn test_legacy_publish_validation_error() {
    let sender = Arc::new(RecordingSender::new(204));
    let router = handler(sender.clone(), Options::default()).await.router();

    let request = Request::post("/my-app/v1/events")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"event-type":"order.created","data":{}}"#))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["type"], "validation_violation");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["event-type-version", "event-time"]);
    assert!(sender.events().is_empty());
}

#[tokio::test]
async fn test_subscribed_events() {
    let sender = Arc::new(RecordingSender::new(204));
    let router = handler(sender, Options::default()).await.router();

    let response = router
        .oneshot(
            Request::get("/commerce/v1/events/subscribed")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({"eventsInfo": [{"name": "order.created", "version": "v1"}]})
    );
}

#[tokio::test]
async fn test_health_routes() {
    let sender = Arc::new(RecordingSender::new(204));
    let h = handler(sender, Options::default()).await;
    let health = h.health.clone();
    let router = h.router();

    let live = router
        .clone()
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(live.status(), StatusCode::OK);

    let not_ready = router
        .clone()
        .oneshot(Request::get("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(not_ready.status(), StatusCode::SERVICE_UNAVAILABLE);

    health.set_ready(true);
    let ready = router
        .oneshot(Request::get("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(ready.status(), StatusCode::OK);
}
