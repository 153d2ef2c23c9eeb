// Shared bootstrap: a stub avatar upstream plus the real gateway, started once per test binary.
use avatar_server::domain::entities::AvatarProfile;
use avatar_server::interface_adapters::clients::avatar::AvatarClient;
use avatar_server::interface_adapters::speech::PlaceholderSpeechToText;
use avatar_server::interface_adapters::state::{AppState, InMemorySessionStore, SystemClock};
use avatar_server::use_cases::SessionManager;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

// Text that makes the stub upstream reject a task.
pub const FAILING_TEXT: &str = "fail-upstream";

static SERVER_URL: OnceLock<String> = OnceLock::new();
static SERVER_READY: OnceLock<()> = OnceLock::new();
static STOPPED: OnceLock<Mutex<Vec<String>>> = OnceLock::new();
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

// Session ids the stub upstream has been asked to stop.
pub fn stopped_sessions() -> Vec<String> {
    STOPPED
        .get_or_init(Default::default)
        .lock()
        .expect("stopped mutex poisoned")
        .clone()
}

fn stub_upstream() -> Router {
    Router::new()
        .route(
            "/v1/streaming.create_token",
            post(|| async {
                let id = NEXT_ID.fetch_add(1, Ordering::SeqCst);
                Json(json!({ "error": null, "data": { "token": format!("bearer-{id}") } }))
            }),
        )
        .route(
            "/v1/streaming.new",
            post(|| async {
                let id = NEXT_ID.fetch_add(1, Ordering::SeqCst);
                Json(json!({
                    "data": {
                        "session_id": format!("sess-{id}"),
                        "url": "wss://media.stub",
                        "access_token": format!("lk-{id}")
                    }
                }))
            }),
        )
        .route(
            "/v1/streaming.start",
            post(|| async { Json(json!({ "code": 100, "message": "success" })) }),
        )
        .route(
            "/v1/streaming.task",
            post(|Json(body): Json<Value>| async move {
                if body["text"] == FAILING_TEXT {
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "message": "task rejected" })),
                    );
                }
                (
                    StatusCode::OK,
                    Json(json!({
                        "code": 100,
                        "data": { "task_id": "t-1", "echo": body["text"] }
                    })),
                )
            }),
        )
        .route(
            "/v1/streaming.stop",
            post(|Json(body): Json<Value>| async move {
                if let Some(id) = body["session_id"].as_str() {
                    STOPPED
                        .get_or_init(Default::default)
                        .lock()
                        .expect("stopped mutex poisoned")
                        .push(id.to_string());
                }
                Json(json!({ "code": 100 }))
            }),
        )
}

// Ensure the stub and gateway are running and return the gateway base URL.
pub fn ensure_server() -> &'static str {
    SERVER_READY.get_or_init(|| {
        let published_url = Arc::new(OnceLock::<String>::new());
        let published_url_thread = Arc::clone(&published_url);
        // Own thread and runtime so the servers outlive individual `#[tokio::test]` runtimes.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                let upstream = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind stub upstream");
                let upstream_addr = upstream.local_addr().expect("stub upstream addr");
                tokio::spawn(async move {
                    let _ = axum::serve(upstream, stub_upstream()).await;
                });

                let avatar = AvatarClient::new(
                    format!("http://{upstream_addr}"),
                    "test-api-key",
                    AvatarProfile::default(),
                    Duration::from_secs(5),
                )
                .expect("avatar client");
                let state = AppState {
                    sessions: Arc::new(SessionManager::new(
                        Arc::new(avatar),
                        Arc::new(InMemorySessionStore::new()),
                        Arc::new(SystemClock),
                        Duration::from_secs(30 * 60),
                    )),
                    speech: Arc::new(PlaceholderSpeechToText::default()),
                };

                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_url_thread.set(format!("http://{}", addr));
                avatar_server::run(listener, state, std::future::pending())
                    .await
                    .expect("server failed");
            });
        });
        wait_for_server_url_and_readiness(published_url);
    });

    SERVER_URL
        .get()
        .expect("server url should be initialized")
        .as_str()
}

fn wait_for_server_url_and_readiness(published_url: Arc<OnceLock<String>>) {
    let base_url = loop {
        if let Some(url) = published_url.get() {
            break url.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    let _ = SERVER_URL.set(base_url.clone());

    let addr = base_url
        .strip_prefix("http://")
        .expect("base url should use http://");

    // Retry for a short period to avoid racing server bind/accept.
    for _ in 0..100 {
        if std::net::TcpStream::connect(addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    panic!("server did not become ready in time");
}
