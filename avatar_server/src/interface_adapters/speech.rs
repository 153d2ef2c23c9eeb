use async_trait::async_trait;

use crate::domain::errors::SessionError;
use crate::domain::ports::SpeechToText;

pub const DEFAULT_PLACEHOLDER_TEXT: &str = "Привет! Это сообщение было отправлено голосом.";

// Stand-in transcriber: any recording becomes the same configured sentence.
#[derive(Debug, Clone)]
pub struct PlaceholderSpeechToText {
    text: String,
}

impl PlaceholderSpeechToText {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Default for PlaceholderSpeechToText {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEHOLDER_TEXT)
    }
}

#[async_trait]
impl SpeechToText for PlaceholderSpeechToText {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, SessionError> {
        if audio.is_empty() {
            return Err(SessionError::Validation("audio is required"));
        }
        if self.text.trim().is_empty() {
            return Err(SessionError::Transcription(
                "placeholder transcript is empty".to_string(),
            ));
        }
        Ok(self.text.clone())
    }
}
