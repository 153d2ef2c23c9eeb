use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::domain::entities::{SessionDescriptor, TaskType};
use crate::domain::errors::UpstreamError;
use crate::domain::ports::{AvatarService, Clock};
use crate::interface_adapters::state::InMemorySessionStore;
use crate::use_cases::session_manager::SessionManager;

pub(crate) const TEST_RETENTION: Duration = Duration::from_secs(30 * 60);

// Clock whose time tests can move forward.
#[derive(Clone)]
pub(crate) struct SettableClock(Arc<AtomicU64>);

impl SettableClock {
    pub(crate) fn new(now: u64) -> Self {
        Self(Arc::new(AtomicU64::new(now)))
    }

    pub(crate) fn set(&self, now: u64) {
        self.0.store(now, Ordering::SeqCst);
    }
}

impl Clock for SettableClock {
    fn now_epoch_seconds(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Copy, Default)]
pub(crate) struct FailureFlags {
    pub token: bool,
    pub create: bool,
    pub start: bool,
    pub task: bool,
    pub stop: bool,
}

// Scripted avatar service that journals every call it receives.
#[derive(Clone)]
pub(crate) struct FakeAvatar {
    journal: Arc<Mutex<Vec<String>>>,
    next_id: Arc<AtomicU64>,
    next_token: Arc<AtomicU64>,
    failures: FailureFlags,
}

impl FakeAvatar {
    pub(crate) fn new() -> Self {
        Self {
            journal: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            next_token: Arc::new(AtomicU64::new(1)),
            failures: FailureFlags::default(),
        }
    }

    pub(crate) fn with_failures(mut self, failures: FailureFlags) -> Self {
        self.failures = failures;
        self
    }

    pub(crate) fn journal(&self) -> Vec<String> {
        self.journal.lock().expect("journal mutex poisoned").clone()
    }

    // Session ids passed to stop_session, in call order.
    pub(crate) fn stopped(&self) -> Vec<String> {
        self.journal()
            .into_iter()
            .filter_map(|call| call.strip_prefix("stop:").map(str::to_string))
            .collect()
    }

    fn record(&self, call: String) {
        self.journal.lock().expect("journal mutex poisoned").push(call);
    }

    fn next(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn next_token(&self) -> u64 {
        self.next_token.fetch_add(1, Ordering::SeqCst)
    }
}

fn rejected(message: &str) -> UpstreamError {
    UpstreamError::Status {
        status: 500,
        message: Some(message.to_string()),
    }
}

#[async_trait]
impl AvatarService for FakeAvatar {
    async fn acquire_token(&self) -> Result<String, UpstreamError> {
        self.record("token".to_string());
        if self.failures.token {
            return Err(UpstreamError::Status {
                status: 401,
                message: Some("invalid api key".to_string()),
            });
        }
        Ok(format!("token-{}", self.next_token()))
    }

    async fn create_session(
        &self,
        _token: &str,
        user_id: &str,
    ) -> Result<SessionDescriptor, UpstreamError> {
        self.record(format!("create:{user_id}"));
        if self.failures.create {
            return Err(rejected("create failed"));
        }
        let id = self.next();
        Ok(SessionDescriptor {
            session_id: format!("session-{id}"),
            url: "wss://media.test".to_string(),
            access_token: format!("access-{id}"),
        })
    }

    async fn start_session(&self, session_id: &str, _token: &str) -> Result<Value, UpstreamError> {
        self.record(format!("start:{session_id}"));
        if self.failures.start {
            return Err(rejected("start failed"));
        }
        Ok(json!({ "code": 100, "message": "success" }))
    }

    async fn send_task(
        &self,
        session_id: &str,
        token: &str,
        text: &str,
        task_type: TaskType,
    ) -> Result<Value, UpstreamError> {
        self.record(format!(
            "task:{session_id}:{token}:{}:{text}",
            task_type.as_str()
        ));
        if self.failures.task {
            return Err(rejected("task failed"));
        }
        Ok(json!({ "code": 100, "data": { "task_id": "task-1" } }))
    }

    async fn stop_session(&self, session_id: &str, _token: &str) -> Result<(), UpstreamError> {
        self.record(format!("stop:{session_id}"));
        if self.failures.stop {
            return Err(UpstreamError::Transport("connection reset".to_string()));
        }
        Ok(())
    }
}

// Builds a manager over an in-memory registry the test can inspect.
pub(crate) fn build_manager(
    avatar: &FakeAvatar,
    clock: SettableClock,
) -> (Arc<SessionManager>, InMemorySessionStore) {
    let store = InMemorySessionStore::new();
    let manager = SessionManager::new(
        Arc::new(avatar.clone()),
        Arc::new(store.clone()),
        Arc::new(clock),
        TEST_RETENTION,
    );
    (Arc::new(manager), store)
}
