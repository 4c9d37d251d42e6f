// Shared harness for integration tests: a mock API server, an in-memory
// store, a manual clock and a view host that records what the SDK asked for.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use storefront_sdk::prelude::*;
use wiremock::MockServer;

/// Fixed start time for the manual clock (2024-05-01T10:00:00Z).
pub const T0: i64 = 1_714_557_600_000;

pub const WINDOW_MS: i64 = 30 * 60 * 1000;

const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Notify(Notification),
    Reload,
    Login,
}

#[derive(Default)]
pub struct RecordingView {
    events: Mutex<Vec<ViewEvent>>,
}

impl RecordingView {
    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::Notify(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    /// Poll until an event matching `predicate` has been recorded.
    pub async fn wait_for(&self, predicate: impl Fn(&ViewEvent) -> bool) -> ViewEvent {
        tokio::time::timeout(WAIT_TIMEOUT, async {
            loop {
                if let Some(found) = self.events().into_iter().find(|e| predicate(e)) {
                    return found;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("timed out waiting for view event")
    }
}

impl ViewHost for RecordingView {
    fn notify(&self, notification: Notification) {
        self.events.lock().unwrap().push(ViewEvent::Notify(notification));
    }

    fn reload(&self) {
        self.events.lock().unwrap().push(ViewEvent::Reload);
    }

    fn redirect_to_login(&self) {
        self.events.lock().unwrap().push(ViewEvent::Login);
    }
}

pub struct Harness {
    pub server: MockServer,
    pub client: StorefrontClient,
    pub store: MemoryStore,
    pub clock: ManualClock,
    pub view: Arc<RecordingView>,
}

/// Start a mock server and build a client pointed at it.
pub async fn harness() -> Harness {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let server = MockServer::start().await;
    let store = MemoryStore::new();
    let clock = ManualClock::new(T0);
    let view = Arc::new(RecordingView::default());
    let client = StorefrontClient::builder()
        .base_url(&server.uri())
        .timeout(Duration::from_secs(2))
        .store(Arc::new(store.clone()))
        .clock(Arc::new(clock.clone()))
        .view(view.clone())
        .build()
        .expect("client should build");

    Harness {
        server,
        client,
        store,
        clock,
        view,
    }
}

/// A client sharing `harness`' store, clock and view but pointed at a port
/// nothing listens on.
pub fn offline_client(harness: &Harness) -> StorefrontClient {
    StorefrontClient::builder()
        .base_url(&format!("http://127.0.0.1:{}", unused_port()))
        .timeout(Duration::from_secs(2))
        .store(Arc::new(harness.store.clone()))
        .clock(Arc::new(harness.clock.clone()))
        .view(harness.view.clone())
        .build()
        .expect("client should build")
}

pub fn unused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    listener.local_addr().expect("local addr").port()
}

/// Error body as the backend sends it.
pub fn envelope(code: &str, status: u16, message: &str, path: &str) -> Value {
    json!({
        "code": code,
        "message": message,
        "status": status,
        "timestamp": "2024-05-01T10:00:00Z",
        "path": path,
    })
}

/// Give spawned handler tasks a chance to run.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}
