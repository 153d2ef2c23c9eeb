use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::entities::TaskType;

// Request payload for session creation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[serde(default, deserialize_with = "flexible_id")]
    pub user_id: Option<String>,
}

// Response payload for session creation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub success: bool,
    pub session_id: String,
    pub token: String,
    pub url: String,
    pub access_token: String,
}

// Request payload for sending a text prompt.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default, deserialize_with = "flexible_id")]
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub token: Option<String>,
    pub text: Option<String>,
    pub task_type: Option<TaskType>,
}

// Response payload for a delivered prompt.
#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub success: bool,
    // Upstream task response, passed through untouched.
    pub data: Value,
}

// Query parameters identifying the session for a voice message.
// The session token is read from the Authorization header instead.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendVoiceQuery {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
}

// Response payload for a transcribed and delivered voice message.
#[derive(Debug, Serialize)]
pub struct SendVoiceResponse {
    pub success: bool,
    pub transcript: String,
    pub data: Value,
}

// Request payload for closing a session.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseSessionRequest {
    pub session_id: Option<String>,
    pub token: Option<String>,
    #[serde(default, deserialize_with = "flexible_id")]
    pub user_id: Option<String>,
}

// Response payload for closing a session.
#[derive(Debug, Serialize)]
pub struct CloseSessionResponse {
    pub success: bool,
}

// Liveness payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub active_sessions: usize,
}

// Error envelope for JSON responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// The messaging platform hands out numeric user ids; browsers may send either form.
fn flexible_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(id)) => Ok(Some(id)),
        Some(Value::Number(id)) => Ok(Some(id.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "userId must be a string or number, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_user_id_is_numeric_then_it_is_read_as_a_string() {
        let request: CreateSessionRequest =
            serde_json::from_str(r#"{"userId":123456789}"#).expect("expected request");

        assert_eq!(request.user_id.as_deref(), Some("123456789"));
    }

    #[test]
    fn when_user_id_is_missing_or_null_then_it_is_none() {
        let missing: CreateSessionRequest = serde_json::from_str("{}").expect("expected request");
        let null: CreateSessionRequest =
            serde_json::from_str(r#"{"userId":null}"#).expect("expected request");

        assert!(missing.user_id.is_none());
        assert!(null.user_id.is_none());
    }

    #[test]
    fn when_user_id_is_an_object_then_deserialization_fails() {
        let result = serde_json::from_str::<CreateSessionRequest>(r#"{"userId":{"id":1}}"#);

        assert!(result.is_err());
    }

    #[test]
    fn when_create_response_is_serialized_then_fields_are_camel_case() {
        let value = serde_json::to_value(CreateSessionResponse {
            success: true,
            session_id: "s1".to_string(),
            token: "t1".to_string(),
            url: "wss://media".to_string(),
            access_token: "a1".to_string(),
        })
        .expect("expected json");

        assert_eq!(value["sessionId"], "s1");
        assert_eq!(value["accessToken"], "a1");
    }
}
