use std::fmt;

// Failure of a single call to the remote avatar service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    Transport(String),
    Status { status: u16, message: Option<String> },
    Decode(String),
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamError::Transport(err) => write!(f, "avatar transport error: {err}"),
            UpstreamError::Status { status, message } => {
                if let Some(message) = message {
                    write!(f, "avatar upstream error {status}: {message}")
                } else {
                    write!(f, "avatar upstream error {status}")
                }
            }
            UpstreamError::Decode(err) => write!(f, "avatar response decode error: {err}"),
        }
    }
}

impl std::error::Error for UpstreamError {}

// Domain-level errors for the session lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    UpstreamAuth(UpstreamError),
    UpstreamCreate(UpstreamError),
    UpstreamStart(UpstreamError),
    UpstreamTask(UpstreamError),
    NoActiveSession,
    Validation(&'static str),
    Transcription(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::UpstreamAuth(err) => write!(f, "token acquisition failed: {err}"),
            SessionError::UpstreamCreate(err) => write!(f, "session creation failed: {err}"),
            SessionError::UpstreamStart(err) => write!(f, "session start failed: {err}"),
            SessionError::UpstreamTask(err) => write!(f, "task delivery failed: {err}"),
            SessionError::NoActiveSession => write!(f, "no active session"),
            SessionError::Validation(message) => write!(f, "{message}"),
            SessionError::Transcription(err) => write!(f, "transcription failed: {err}"),
        }
    }
}

impl std::error::Error for SessionError {}
