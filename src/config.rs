//! Configuration options for the Resolution client

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable overriding the backend origin
pub const API_URL_ENV: &str = "NEXT_PUBLIC_API_URL";

/// Environment variable overriding where the session is persisted
pub const SESSION_PATH_ENV: &str = "RESOLUTION_SESSION_PATH";

/// Backend origin used when nothing else is configured
pub const DEFAULT_ORIGIN: &str = "http://localhost:8000";

/// Default wait between two verification-code resends
pub const DEFAULT_RESEND_COOLDOWN: Duration = Duration::from_secs(30);

/// Configuration options for the Resolution client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL of the REST API, `/api` included
    pub api_url: String,

    /// The request timeout; `None` leaves requests unbounded
    pub request_timeout: Option<Duration>,

    /// Whether the session is mirrored to disk
    pub persist_session: bool,

    /// Where the session file lives
    pub session_path: PathBuf,

    /// Wait between verification-code resends
    pub resend_cooldown: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_url: api_url_from_origin(DEFAULT_ORIGIN),
            request_timeout: None,
            persist_session: true,
            session_path: default_session_path(),
            resend_cooldown: DEFAULT_RESEND_COOLDOWN,
        }
    }
}

impl ClientOptions {
    /// Build options from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let mut options = Self::default();

        match env::var(API_URL_ENV) {
            Ok(origin) if !origin.trim().is_empty() => {
                options.api_url = api_url_from_origin(&origin);
            }
            _ => log::debug!("{API_URL_ENV} not set, using {DEFAULT_ORIGIN}"),
        }

        if let Ok(path) = env::var(SESSION_PATH_ENV) {
            options.session_path = PathBuf::from(path);
        }

        options
    }

    /// Set the API base from a backend origin (`/api` is appended)
    pub fn with_origin(mut self, origin: &str) -> Self {
        self.api_url = api_url_from_origin(origin);
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set whether to persist the session
    pub fn with_persist_session(mut self, value: bool) -> Self {
        self.persist_session = value;
        self
    }

    /// Set the session file path
    pub fn with_session_path(mut self, value: impl Into<PathBuf>) -> Self {
        self.session_path = value.into();
        self
    }

    /// Set the resend cooldown
    pub fn with_resend_cooldown(mut self, value: Duration) -> Self {
        self.resend_cooldown = value;
        self
    }
}

/// Normalize an origin into the API base, appending `/api` once
pub fn api_url_from_origin(origin: &str) -> String {
    let trimmed = origin.trim().trim_end_matches('/');
    if trimmed.ends_with("/api") {
        trimmed.to_string()
    } else {
        format!("{}/api", trimmed)
    }
}

fn default_session_path() -> PathBuf {
    let base = env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(env::temp_dir);
    base.join(".resolution").join("session.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_from_origin() {
        assert_eq!(api_url_from_origin("http://localhost:8000"), "http://localhost:8000/api");
        assert_eq!(api_url_from_origin("http://example.com/"), "http://example.com/api");
        assert_eq!(api_url_from_origin("http://example.com/api/"), "http://example.com/api");
    }

    #[test]
    fn test_builder() {
        let options = ClientOptions::default()
            .with_origin("http://backend:9000")
            .with_persist_session(false)
            .with_resend_cooldown(Duration::from_secs(5));

        assert_eq!(options.api_url, "http://backend:9000/api");
        assert!(!options.persist_session);
        assert_eq!(options.resend_cooldown, Duration::from_secs(5));
        assert!(options.request_timeout.is_none());
    }
}
