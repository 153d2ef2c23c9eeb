// Framework bootstrap for the avatar gateway.

use crate::frameworks::config;
use crate::interface_adapters::bot;
use crate::interface_adapters::clients::avatar::AvatarClient;
use crate::interface_adapters::routes;
use crate::interface_adapters::speech::PlaceholderSpeechToText;
use crate::interface_adapters::state::{AppState, InMemorySessionStore, SystemClock};
use crate::use_cases::{SessionManager, spawn_sweeper};
use std::future::Future;
use std::io::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Notify;

fn init_runtime() {
    // Load .env locally; safe to ignore when not present.
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

// Serve the gateway on an already-bound listener until `shutdown` resolves.
pub async fn run<F>(listener: tokio::net::TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let address = listener.local_addr()?;
    let app = routes::app(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .inspect_err(|e| {
            tracing::error!(error = %e, "server error");
        })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let port = config::http_port();
    let address = SocketAddr::from(([0, 0, 0, 0], port));

    let state = build_state()?;

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    // The sweep is the only autonomous work; it stops with the server.
    let sweeper_shutdown = Arc::new(Notify::new());
    let sweeper = spawn_sweeper(
        state.sessions.clone(),
        config::sweep_interval(),
        sweeper_shutdown.clone(),
    );

    match config::telegram_bot_token() {
        Some(token) => match config::webapp_url(port) {
            Ok(webapp_url) => {
                tokio::spawn(bot::run(token, webapp_url));
            }
            Err(e) => tracing::error!(error = %e, "invalid PUBLIC_BASE_URL; bot disabled"),
        },
        None => tracing::info!("TELEGRAM_BOT_TOKEN not set; bot disabled"),
    }

    let result = run(listener, state, shutdown_signal()).await;

    sweeper_shutdown.notify_one();
    let _ = sweeper.await;
    result
}

pub fn build_state() -> Result<AppState> {
    let profile = config::avatar_profile().map_err(|e| {
        tracing::error!(error = %e, "failed to load avatar profile");
        std::io::Error::other(e.to_string())
    })?;

    let api_key = config::avatar_api_key().unwrap_or_else(|| {
        tracing::warn!("AVATAR_API_KEY not set; token acquisition will be rejected upstream");
        String::new()
    });
    let api_url = config::avatar_api_url();
    let timeout = config::avatar_request_timeout();
    let avatar = AvatarClient::new(api_url.clone(), api_key, profile, timeout)
        .map_err(|e| std::io::Error::other(format!("failed to initialize avatar client: {e}")))?;
    tracing::debug!(
        avatar_api_url = %api_url,
        avatar_request_timeout_ms = timeout.as_millis(),
        "avatar client configured"
    );

    let retention = config::session_retention();
    let sessions = SessionManager::new(
        Arc::new(avatar),
        Arc::new(InMemorySessionStore::new()),
        Arc::new(SystemClock),
        retention,
    );
    tracing::debug!(retention_secs = retention.as_secs(), "session manager configured");

    Ok(AppState {
        sessions: Arc::new(sessions),
        speech: Arc::new(PlaceholderSpeechToText::new(config::speech_placeholder_text())),
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
