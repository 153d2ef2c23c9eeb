use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

use crate::domain::entities::SessionRecord;
use crate::domain::ports::{Clock, SessionStore, SpeechToText};
use crate::use_cases::SessionManager;

// Application state shared by every HTTP handler.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    // Speech capability stays outside the lifecycle manager so it can be swapped freely.
    pub speech: Arc<dyn SpeechToText>,
}

// In-memory session registry keyed by user id.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<Mutex<HashMap<String, SessionRecord>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, record: SessionRecord) -> Option<SessionRecord> {
        let mut sessions = self.sessions.lock().await;
        sessions.insert(record.user_id.clone(), record)
    }

    async fn get(&self, user_id: &str) -> Option<SessionRecord> {
        let sessions = self.sessions.lock().await;
        sessions.get(user_id).cloned()
    }

    async fn find_by_session_id(&self, session_id: &str) -> Option<SessionRecord> {
        let sessions = self.sessions.lock().await;
        sessions
            .values()
            .find(|record| record.session_id == session_id)
            .cloned()
    }

    async fn remove(&self, user_id: &str, session_id: Option<&str>) -> Option<SessionRecord> {
        let mut sessions = self.sessions.lock().await;
        let matches = sessions
            .get(user_id)
            .is_some_and(|record| session_id.is_none_or(|id| id == record.session_id));
        if matches {
            sessions.remove(user_id)
        } else {
            None
        }
    }

    async fn older_than(&self, now: u64, max_age_seconds: u64) -> Vec<SessionRecord> {
        let sessions = self.sessions.lock().await;
        sessions
            .values()
            .filter(|record| record.age_seconds(now) > max_age_seconds)
            .cloned()
            .collect()
    }

    async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

// System clock adapter used by the session manager.
#[derive(Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_seconds(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}
