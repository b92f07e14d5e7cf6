//! Header-based user resolution and query-string login redirects

use super::{LoginUriProvider, UserManager};
use crate::config::AuthConfig;
use axum::http::HeaderMap;
use std::collections::HashSet;

/// Trusts a username header set by the fronting proxy
pub struct HeaderUserManager {
    header: String,
    admins: HashSet<String>,
}

impl HeaderUserManager {
    pub fn new(header: impl Into<String>, admins: impl IntoIterator<Item = String>) -> Self {
        Self {
            header: header.into().to_ascii_lowercase(),
            admins: admins.into_iter().collect(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.user_header.clone(), config.admins.iter().cloned())
    }
}

impl UserManager for HeaderUserManager {
    fn remote_username(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get(self.header.as_str())
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn is_admin(&self, username: &str) -> bool {
        self.admins.contains(username)
    }
}

/// Login page that takes the return URL as a query parameter
pub struct QueryLoginUriProvider {
    login_url: String,
    return_param: String,
}

impl QueryLoginUriProvider {
    pub fn new(login_url: impl Into<String>, return_param: impl Into<String>) -> Self {
        Self {
            login_url: login_url.into(),
            return_param: return_param.into(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.login_url.clone(), config.return_param.clone())
    }
}

impl LoginUriProvider for QueryLoginUriProvider {
    fn login_uri(&self, return_url: &str) -> String {
        let separator = if self.login_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}{}={}",
            self.login_url,
            separator,
            self.return_param,
            urlencoding::encode(return_url)
        )
    }
}
