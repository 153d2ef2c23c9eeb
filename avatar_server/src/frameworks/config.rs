use crate::domain::entities::AvatarProfile;
use crate::interface_adapters::speech::DEFAULT_PLACEHOLDER_TEXT;
use std::path::Path;
use std::str::FromStr;
use std::{env, fmt, time::Duration};
use url::Url;

// Runtime/server settings, read from the environment (`.env` is loaded first).

pub const DEFAULT_AVATAR_API_URL: &str = "https://api.heygen.com";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_SESSION_RETENTION: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

pub fn http_port() -> u16 {
    parse_or(env::var("PORT").ok(), 3000)
}

pub fn avatar_api_url() -> String {
    env::var("AVATAR_API_URL").unwrap_or_else(|_| DEFAULT_AVATAR_API_URL.to_string())
}

pub fn avatar_api_key() -> Option<String> {
    non_empty(env::var("AVATAR_API_KEY").ok())
}

pub fn avatar_request_timeout() -> Duration {
    millis_or(env::var("AVATAR_REQUEST_TIMEOUT_MS").ok(), DEFAULT_REQUEST_TIMEOUT)
}

pub fn session_retention() -> Duration {
    seconds_or(env::var("SESSION_RETENTION_SECS").ok(), DEFAULT_SESSION_RETENTION)
}

pub fn sweep_interval() -> Duration {
    seconds_or(env::var("SWEEP_INTERVAL_SECS").ok(), DEFAULT_SWEEP_INTERVAL)
}

pub fn telegram_bot_token() -> Option<String> {
    non_empty(env::var("TELEGRAM_BOT_TOKEN").ok())
}

pub fn speech_placeholder_text() -> String {
    non_empty(env::var("SPEECH_PLACEHOLDER_TEXT").ok())
        .unwrap_or_else(|| DEFAULT_PLACEHOLDER_TEXT.to_string())
}

// Link the bot hands out for the mini-app.
pub fn webapp_url(port: u16) -> Result<Url, url::ParseError> {
    let base = non_empty(env::var("PUBLIC_BASE_URL").ok())
        .unwrap_or_else(|| format!("http://localhost:{port}"));
    build_webapp_url(&base)
}

pub fn avatar_profile() -> Result<AvatarProfile, ProfileError> {
    match non_empty(env::var("AVATAR_PROFILE_PATH").ok()) {
        Some(path) => load_avatar_profile(Path::new(&path)),
        None => Ok(AvatarProfile::default()),
    }
}

#[derive(Debug)]
pub enum ProfileError {
    Read(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileError::Read(err) => write!(f, "failed to read avatar profile: {err}"),
            ProfileError::Parse(err) => write!(f, "failed to parse avatar profile: {err}"),
        }
    }
}

impl std::error::Error for ProfileError {}

// Fields missing from the file keep their defaults.
pub fn load_avatar_profile(path: &Path) -> Result<AvatarProfile, ProfileError> {
    let raw = std::fs::read_to_string(path).map_err(ProfileError::Read)?;
    toml::from_str(&raw).map_err(ProfileError::Parse)
}

fn build_webapp_url(base: &str) -> Result<Url, url::ParseError> {
    Url::parse(&format!("{}/webapp", base.trim_end_matches('/')))
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn seconds_or(value: Option<String>, default: Duration) -> Duration {
    positive(value).map(Duration::from_secs).unwrap_or(default)
}

fn millis_or(value: Option<String>, default: Duration) -> Duration {
    positive(value).map(Duration::from_millis).unwrap_or(default)
}

// Zero would disable the timer or timeout it configures, so it counts as unset.
fn positive(value: Option<String>) -> Option<u64> {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|n| *n > 0)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
