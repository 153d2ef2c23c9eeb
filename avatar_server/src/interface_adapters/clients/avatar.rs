use crate::domain::entities::{AvatarProfile, SessionDescriptor, TaskType};
use crate::domain::errors::UpstreamError;
use crate::domain::ports::AvatarService;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

// Thin reqwest client for the avatar streaming API.
#[derive(Clone)]
pub struct AvatarClient {
    http: Client,
    base_url: String,
    api_key: String,
    profile: AvatarProfile,
}

// Every upstream payload is wrapped in a `data` envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct TokenData {
    token: String,
}

#[derive(Debug, Serialize)]
struct EmptyBody {}

#[derive(Debug, Serialize)]
struct SessionIdBody<'a> {
    session_id: &'a str,
}

#[derive(Debug, Serialize)]
struct TaskBody<'a> {
    session_id: &'a str,
    text: &'a str,
    task_type: TaskType,
}

enum Credential<'a> {
    ApiKey(&'a str),
    Bearer(&'a str),
}

impl AvatarClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        profile: AvatarProfile,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            profile,
        })
    }

    async fn post<B: Serialize>(
        &self,
        endpoint: &str,
        credential: Credential<'_>,
        body: &B,
    ) -> Result<Response, UpstreamError> {
        let url = format!("{}/v1/{}", self.base_url, endpoint);
        let request = self.http.post(url).json(body);
        let request = match credential {
            Credential::ApiKey(key) => request.header("X-Api-Key", key),
            Credential::Bearer(token) => request.bearer_auth(token),
        };

        let res = request
            .send()
            .await
            .map_err(|err| UpstreamError::Transport(err.to_string()))?;
        let status = res.status();

        // Keep the upstream message so callers can see why the service refused.
        if !status.is_success() {
            let message = res
                .text()
                .await
                .ok()
                .and_then(|body| upstream_message(&body));
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(res)
    }
}

async fn decode<T: DeserializeOwned>(res: Response) -> Result<T, UpstreamError> {
    res.json::<T>()
        .await
        .map_err(|err| UpstreamError::Decode(err.to_string()))
}

// Pull a human-readable reason out of an upstream error body.
fn upstream_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let candidates = [
        value.get("message"),
        value.get("error").and_then(|error| error.get("message")),
        value.get("error"),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|candidate| candidate.as_str().map(str::to_string))
}

#[async_trait]
impl AvatarService for AvatarClient {
    async fn acquire_token(&self) -> Result<String, UpstreamError> {
        let res = self
            .post(
                "streaming.create_token",
                Credential::ApiKey(&self.api_key),
                &EmptyBody {},
            )
            .await?;
        let envelope: Envelope<TokenData> = decode(res).await?;
        Ok(envelope.data.token)
    }

    async fn create_session(
        &self,
        token: &str,
        user_id: &str,
    ) -> Result<SessionDescriptor, UpstreamError> {
        tracing::debug!(
            user_id,
            avatar = %self.profile.avatar_name,
            "requesting new avatar session"
        );
        let res = self
            .post("streaming.new", Credential::Bearer(token), &self.profile)
            .await?;
        let envelope: Envelope<SessionDescriptor> = decode(res).await?;
        Ok(envelope.data)
    }

    async fn start_session(&self, session_id: &str, token: &str) -> Result<Value, UpstreamError> {
        let res = self
            .post(
                "streaming.start",
                Credential::Bearer(token),
                &SessionIdBody { session_id },
            )
            .await?;
        decode(res).await
    }

    async fn send_task(
        &self,
        session_id: &str,
        token: &str,
        text: &str,
        task_type: TaskType,
    ) -> Result<Value, UpstreamError> {
        let res = self
            .post(
                "streaming.task",
                Credential::Bearer(token),
                &TaskBody {
                    session_id,
                    text,
                    task_type,
                },
            )
            .await?;
        decode(res).await
    }

    async fn stop_session(&self, session_id: &str, token: &str) -> Result<(), UpstreamError> {
        self.post(
            "streaming.stop",
            Credential::Bearer(token),
            &SessionIdBody { session_id },
        )
        .await?;
        Ok(())
    }
}
