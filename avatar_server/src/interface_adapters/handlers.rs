use crate::domain::entities::TaskType;
use crate::domain::errors::SessionError;
use crate::interface_adapters::protocol::{
    CloseSessionRequest, CloseSessionResponse, CreateSessionRequest, CreateSessionResponse,
    ErrorResponse, HealthResponse, SendMessageRequest, SendMessageResponse, SendVoiceQuery,
    SendVoiceResponse,
};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{CloseSession, SendMessage};
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::Html;
use axum::Json;

// Browser mini-app served to the messaging platform's web view.
const WEBAPP_HTML: &str = include_str!("../../web/webapp.html");

type ApiError = (StatusCode, Json<ErrorResponse>);

// Handler for creating and starting an avatar session.
#[tracing::instrument(name = "create_session", skip_all, fields(user_id = ?payload.user_id))]
pub async fn create_session(
    State(state): State<AppState>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, ApiError> {
    let user_id = payload.user_id.unwrap_or_default();

    let created = state
        .sessions
        .create_session(&user_id)
        .await
        .map_err(|err| map_session_error(err, ErrorContext::CreateSession))?;

    Ok(Json(CreateSessionResponse {
        success: true,
        session_id: created.session_id,
        token: created.token,
        url: created.url,
        access_token: created.access_token,
    }))
}

// Handler for forwarding a text prompt to the caller's session.
#[tracing::instrument(
    name = "send_message",
    skip_all,
    fields(user_id = ?payload.user_id, session_id = ?payload.session_id)
)]
pub async fn send_message(
    State(state): State<AppState>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    let data = state
        .sessions
        .send_message(SendMessage {
            user_id: payload.user_id,
            session_id: payload.session_id,
            token: payload.token,
            text: payload.text.unwrap_or_default(),
            task_type: payload.task_type.unwrap_or_default(),
        })
        .await
        .map_err(|err| map_session_error(err, ErrorContext::SendMessage))?;

    Ok(Json(SendMessageResponse {
        success: true,
        data,
    }))
}

// Handler for voice prompts: transcribe, then deliver as a conversational task.
// The session token travels in the `Authorization: Bearer` header, never in the URL.
#[tracing::instrument(
    name = "send_voice",
    skip_all,
    fields(user_id = ?query.user_id, audio_bytes = audio.len())
)]
pub async fn send_voice(
    State(state): State<AppState>,
    Query(query): Query<SendVoiceQuery>,
    headers: HeaderMap,
    audio: Bytes,
) -> Result<Json<SendVoiceResponse>, ApiError> {
    let Some(token) = bearer_token(&headers) else {
        return Err(error_response(StatusCode::BAD_REQUEST, "token is required", None));
    };

    let transcript = state
        .speech
        .transcribe(&audio)
        .await
        .map_err(|err| map_session_error(err, ErrorContext::SendVoice))?;

    let data = state
        .sessions
        .send_message(SendMessage {
            user_id: query.user_id,
            session_id: query.session_id,
            token: Some(token.to_string()),
            text: transcript.clone(),
            task_type: TaskType::Talk,
        })
        .await
        .map_err(|err| map_session_error(err, ErrorContext::SendVoice))?;

    Ok(Json(SendVoiceResponse {
        success: true,
        transcript,
        data,
    }))
}

// Handler for closing a session. Always reports success.
#[tracing::instrument(name = "close_session", skip_all)]
pub async fn close_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Json<CloseSessionResponse> {
    // A malformed body is treated as a no-op close rather than an error.
    let payload = serde_json::from_slice::<CloseSessionRequest>(&body).unwrap_or_else(|err| {
        tracing::debug!(error = %err, "ignoring unreadable close payload");
        CloseSessionRequest::default()
    });

    let outcome = state
        .sessions
        .close_session(CloseSession {
            user_id: payload.user_id,
            session_id: payload.session_id,
            token: payload.token,
        })
        .await;
    tracing::info!(removed = outcome.removed, "close request handled");

    Json(CloseSessionResponse { success: true })
}

// Liveness probe with the current registry size.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        timestamp: chrono::Utc::now().to_rfc3339(),
        active_sessions: state.sessions.active_sessions().await,
    })
}

pub async fn webapp() -> Html<&'static str> {
    Html(WEBAPP_HTML)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

// Maps domain errors to HTTP responses by endpoint context.
enum ErrorContext {
    CreateSession,
    SendMessage,
    SendVoice,
}

impl ErrorContext {
    fn failure(&self) -> &'static str {
        match self {
            ErrorContext::CreateSession => "Failed to create session",
            ErrorContext::SendMessage => "Failed to send message",
            ErrorContext::SendVoice => "Failed to process voice message",
        }
    }
}

fn map_session_error(err: SessionError, context: ErrorContext) -> ApiError {
    match err {
        SessionError::Validation(message) => error_response(StatusCode::BAD_REQUEST, message, None),
        SessionError::NoActiveSession => {
            error_response(StatusCode::NOT_FOUND, "No active session", None)
        }
        SessionError::UpstreamAuth(_)
        | SessionError::UpstreamCreate(_)
        | SessionError::UpstreamStart(_)
        | SessionError::UpstreamTask(_)
        | SessionError::Transcription(_) => {
            tracing::error!(error = %err, "{}", context.failure());
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                context.failure(),
                Some(err.to_string()),
            )
        }
    }
}

// Helper to build a JSON error response.
fn error_response(status: StatusCode, error: &str, message: Option<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            success: false,
            error: error.to_string(),
            message,
        }),
    )
}
