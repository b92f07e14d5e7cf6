//! HTTP tracker client (reqwest)

use super::{TrackerConnector, TrackerSession};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderName, AUTHORIZATION, COOKIE, SET_COOKIE};
use reqwest::Url;
use std::time::Duration;

/// Login endpoint, relative to the tracker host
const LOGIN_PATH: &str = "user/login";

/// Builds reqwest-backed tracker sessions
#[derive(Debug, Clone, Default)]
pub struct HttpTrackerConnector {
    connect_timeout: Option<Duration>,
}

impl HttpTrackerConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the TCP/TLS connect phase of validation requests
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }
}

impl TrackerConnector for HttpTrackerConnector {
    fn connect(&self, host: &str, trust_all: bool) -> Result<Box<dyn TrackerSession>> {
        let base = Url::parse(host)
            .map_err(|e| Error::Tracker(format!("Invalid tracker host '{}': {}", host, e)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::Tracker(format!(
                "Unsupported tracker scheme '{}'",
                base.scheme()
            )));
        }

        let mut builder = reqwest::Client::builder().danger_accept_invalid_certs(trust_all);
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Box::new(HttpTrackerSession {
            client,
            base,
            use_token: false,
            authorization: String::new(),
        }))
    }
}

/// Session against one tracker host
pub struct HttpTrackerSession {
    client: reqwest::Client,
    base: Url,
    use_token: bool,
    authorization: String,
}

impl HttpTrackerSession {
    /// Header to send on tracker requests: a bearer token in token mode, the
    /// login cookies otherwise
    pub fn request_authorization(&self) -> Option<(HeaderName, String)> {
        if self.authorization.is_empty() {
            None
        } else if self.use_token {
            Some((AUTHORIZATION, format!("Bearer {}", self.authorization)))
        } else {
            Some((COOKIE, self.authorization.clone()))
        }
    }
}

#[async_trait]
impl TrackerSession for HttpTrackerSession {
    fn set_use_token_authorization(&mut self, use_token: bool) {
        self.use_token = use_token;
    }

    fn set_authorization(&mut self, authorization: &str) {
        tracing::debug!(
            host = %self.base,
            token_auth = self.use_token,
            "Tracker authorization set"
        );
        self.authorization = authorization.to_string();
    }

    async fn login(&mut self, login: &str, password: &str) -> Result<()> {
        let url = self
            .base
            .join(LOGIN_PATH)
            .map_err(|e| Error::Tracker(format!("Invalid login URL: {}", e)))?;

        let response = self
            .client
            .post(url)
            .form(&[("login", login), ("password", password)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Tracker(format!("Login rejected with status {}", status)));
        }

        let cookies: Vec<&str> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect();
        if cookies.is_empty() {
            return Err(Error::Tracker(
                "Login succeeded but no session cookie was issued".to_string(),
            ));
        }

        self.authorization = cookies.join("; ");
        tracing::debug!(host = %self.base, "Tracker login succeeded");
        Ok(())
    }

    fn authorization(&self) -> &str {
        &self.authorization
    }
}
