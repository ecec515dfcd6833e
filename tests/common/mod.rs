//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use tokio::net::TcpListener;

use eventmesh_publisher::cloudevents::CloudEvent;
use eventmesh_publisher::cluster::memory::{MemoryCluster, MemoryConnector, MemoryInformer};
use eventmesh_publisher::cluster::{Application, Subscription, SubscriptionSpec, TypeMatching};
use eventmesh_publisher::config::EnvSource;
use eventmesh_publisher::sender::{MessageSender, SendAck, SendError};

pub const PREFIX: &str = "sap.kyma.custom";
pub const NAMESPACE: &str = "/default/kyma/id";

#[derive(Default)]
struct MockState {
    events: Mutex<Vec<serde_json::Value>>,
    status: AtomicU16,
    token_calls: AtomicU32,
}

/// A mock EventMesh: a token endpoint and a publish endpoint.
#[derive(Clone)]
pub struct MockEventMesh {
    pub addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockEventMesh {
    pub async fn start() -> Self {
        let state = Arc::new(MockState {
            status: AtomicU16::new(204),
            ..Default::default()
        });

        let app = Router::new()
            .route("/token", post(token))
            .route("/events", post(publish))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn token_url(&self) -> String {
        format!("http://{}/token", self.addr)
    }

    pub fn publish_url(&self) -> String {
        format!("http://{}/events", self.addr)
    }

    /// Status returned for subsequent publish calls.
    pub fn respond_with(&self, status: u16) {
        self.state.status.store(status, Ordering::SeqCst);
    }

    pub fn received(&self) -> Vec<serde_json::Value> {
        self.state.events.lock().unwrap().clone()
    }

    pub fn token_calls(&self) -> u32 {
        self.state.token_calls.load(Ordering::SeqCst)
    }
}

async fn token(State(state): State<Arc<MockState>>) -> Json<serde_json::Value> {
    let n = state.token_calls.fetch_add(1, Ordering::SeqCst);
    Json(serde_json::json!({
        "access_token": format!("token-{}", n),
        "token_type": "bearer",
        "expires_in": 3600
    }))
}

async fn publish(
    State(state): State<Arc<MockState>>,
    Json(event): Json<serde_json::Value>,
) -> StatusCode {
    state.events.lock().unwrap().push(event);
    StatusCode::from_u16(state.status.load(Ordering::SeqCst)).unwrap()
}

/// A sender that records events instead of sending them.
pub struct RecordingSender {
    status: u16,
    events: Mutex<Vec<CloudEvent>>,
}

impl RecordingSender {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<CloudEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send(&self, event: &CloudEvent) -> Result<SendAck, SendError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(SendAck {
            status: self.status,
            body: String::new(),
        })
    }

    fn url(&self) -> &str {
        "memory://recording"
    }
}

/// A complete environment for the commander, with `overrides` applied.
pub fn env(mesh: &MockEventMesh, overrides: &[(&str, &str)]) -> EnvSource {
    let mut vars: HashMap<String, String> = [
        ("CLIENT_ID", "client".to_string()),
        ("CLIENT_SECRET", "secret".to_string()),
        ("TOKEN_ENDPOINT", mesh.token_url()),
        ("EMS_PUBLISH_URL", mesh.publish_url()),
        ("EVENT_TYPE_PREFIX", PREFIX.to_string()),
        ("BEB_NAMESPACE", NAMESPACE.to_string()),
        ("INGRESS_PORT", "0".to_string()),
        ("REQUEST_TIMEOUT", "2s".to_string()),
        ("INFORMER_SYNC_TIMEOUT", "1s".to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    for (k, v) in overrides {
        vars.insert(k.to_string(), v.to_string());
    }
    EnvSource::Map(vars)
}

/// A port that was free a moment ago.
pub async fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

pub fn subscription(name: &str, types: &[&str]) -> Subscription {
    Subscription {
        name: name.into(),
        namespace: "default".into(),
        spec: SubscriptionSpec {
            source: String::new(),
            types: types.iter().map(|t| t.to_string()).collect(),
            type_matching: TypeMatching::Standard,
        },
    }
}

/// A connector over in-memory informers that sync immediately.
pub fn synced_cluster(applications: Vec<Application>, subscriptions: Vec<Subscription>) -> MemoryConnector {
    MemoryConnector::new(MemoryCluster::new(
        Arc::new(MemoryInformer::synced(applications)),
        Arc::new(MemoryInformer::synced(subscriptions)),
    ))
}

/// Poll `url` until it answers 200 or `timeout` passes.
pub async fn wait_ready(url: &str, timeout: Duration) -> bool {
    let client = reqwest::Client::new();
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if let Ok(resp) = client.get(url).send().await {
            if resp.status().is_success() {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
