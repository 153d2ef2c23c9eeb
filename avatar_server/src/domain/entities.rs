use serde::{Deserialize, Serialize};
use std::fmt;

// Live avatar-streaming session owned by one user.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub user_id: String,
    pub session_id: String,
    // Bearer credential for follow-up upstream calls; stays in process memory.
    pub token: String,
    pub url: String,
    pub access_token: String,
    pub started_at: u64,
}

impl SessionRecord {
    // Seconds elapsed since the session was registered.
    pub fn age_seconds(&self, now: u64) -> u64 {
        now.saturating_sub(self.started_at)
    }
}

// Credentials must not end up in logs through `{:?}`.
impl fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRecord")
            .field("user_id", &self.user_id)
            .field("session_id", &self.session_id)
            .field("token", &"<redacted>")
            .field("url", &self.url)
            .field("access_token", &"<redacted>")
            .field("started_at", &self.started_at)
            .finish()
    }
}

// Session parameters returned by the upstream when a session is created.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionDescriptor {
    pub session_id: String,
    pub url: String,
    pub access_token: String,
}

// How the avatar should treat a text prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    // Conversational reply generated by the avatar service.
    #[default]
    Talk,
    // Literal playback of the supplied text.
    Repeat,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Talk => "talk",
            TaskType::Repeat => "repeat",
        }
    }
}

// Avatar, voice and language used for every new session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarProfile {
    pub quality: String,
    pub avatar_name: String,
    pub voice: VoiceSettings,
    pub version: String,
    pub video_encoding: String,
    pub language: String,
    pub knowledge_base: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSettings {
    pub voice_id: String,
    pub rate: f32,
    pub emotion: String,
}

impl Default for AvatarProfile {
    fn default() -> Self {
        Self {
            quality: "high".to_string(),
            avatar_name: "Wayne_20240711".to_string(),
            voice: VoiceSettings::default(),
            version: "v2".to_string(),
            video_encoding: "H264".to_string(),
            language: "ru".to_string(),
            knowledge_base: "Ты дружелюбный русскоговорящий ассистент. Отвечай коротко и по существу. Ты можешь помочь с любыми вопросами.".to_string(),
        }
    }
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            voice_id: "ec68fe1ddb6f4d5ba2d6a6b165f54a74".to_string(),
            rate: 1.0,
            emotion: "FRIENDLY".to_string(),
        }
    }
}
