use async_trait::async_trait;
use serde_json::Value;

use crate::domain::entities::{SessionDescriptor, SessionRecord, TaskType};
use crate::domain::errors::{SessionError, UpstreamError};

// Port for the remote avatar-streaming service.
#[async_trait]
pub trait AvatarService: Send + Sync {
    async fn acquire_token(&self) -> Result<String, UpstreamError>;
    async fn create_session(
        &self,
        token: &str,
        user_id: &str,
    ) -> Result<SessionDescriptor, UpstreamError>;
    async fn start_session(&self, session_id: &str, token: &str) -> Result<Value, UpstreamError>;
    async fn send_task(
        &self,
        session_id: &str,
        token: &str,
        text: &str,
        task_type: TaskType,
    ) -> Result<Value, UpstreamError>;
    async fn stop_session(&self, session_id: &str, token: &str) -> Result<(), UpstreamError>;
}

// Port for the process-local session registry, keyed by user id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    // Inserts or overwrites; returns the replaced record.
    async fn insert(&self, record: SessionRecord) -> Option<SessionRecord>;
    async fn get(&self, user_id: &str) -> Option<SessionRecord>;
    async fn find_by_session_id(&self, session_id: &str) -> Option<SessionRecord>;
    // Removes the user's record, only when it still holds `session_id` if one is given.
    async fn remove(&self, user_id: &str, session_id: Option<&str>) -> Option<SessionRecord>;
    async fn older_than(&self, now: u64, max_age_seconds: u64) -> Vec<SessionRecord>;
    async fn len(&self) -> usize;
}

// Port for retrieving the current time.
pub trait Clock: Send + Sync {
    fn now_epoch_seconds(&self) -> u64;
}

// Port for turning recorded audio into a text prompt.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, SessionError>;
}
