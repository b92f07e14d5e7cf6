//! Settings record and form types
//!
//! `IntegrationConfig` is the typed form of the single settings record. The
//! host store only understands flat string maps, so booleans and integers are
//! converted to and from strings at that boundary and nowhere else.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Store key of the settings record
pub const SETTINGS_KEY: &str = "trackerlink.settings";

pub const URL_SEPARATOR: &str = "/";
/// REST segment stripped from the host when deriving the link base
pub const REST_PREFIX: &str = "rest/";
pub const DEFAULT_RETRIES: u32 = 10;

pub const HOST: &str = "host";
pub const LINKBASE: &str = "linkbase";
pub const LOGIN: &str = "login";
pub const PASSWORD: &str = "password";
pub const AUTH_KEY: &str = "authKey";
pub const USE_TOKEN: &str = "useToken";
pub const RETRIES: &str = "retries";
pub const TRUST_ALL: &str = "trustAll";
pub const EXTENDED_DEBUG: &str = "extendedDebug";

/// Flat string map as persisted by the settings store
pub type Properties = BTreeMap<String, String>;

/// Tracker integration settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationConfig {
    /// Base URL of the tracker, always ends with `/`
    pub host: String,
    /// Prefix for back-links into the tracker, always ends with `/`
    pub linkbase: String,
    pub login: String,
    pub password: String,
    /// Active token in token mode, session-derived token in basic mode
    pub auth_token: String,
    pub use_token_auth: bool,
    pub retries: u32,
    pub trust_all_certificates: bool,
    pub extended_debug: bool,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            linkbase: String::new(),
            login: String::new(),
            password: String::new(),
            auth_token: String::new(),
            use_token_auth: true,
            retries: DEFAULT_RETRIES,
            trust_all_certificates: false,
            extended_debug: false,
        }
    }
}

impl IntegrationConfig {
    /// Read a stored record, substituting defaults for missing or malformed keys
    pub fn from_properties(props: &Properties) -> Self {
        let defaults = Self::default();
        let text = |key: &str| props.get(key).cloned().unwrap_or_default();
        let flag = |key: &str, default: bool| {
            props
                .get(key)
                .and_then(|v| v.parse::<bool>().ok())
                .unwrap_or(default)
        };

        Self {
            host: text(HOST),
            linkbase: text(LINKBASE),
            login: text(LOGIN),
            password: text(PASSWORD),
            auth_token: text(AUTH_KEY),
            use_token_auth: flag(USE_TOKEN, defaults.use_token_auth),
            retries: props
                .get(RETRIES)
                .map(|v| parse_retries(v))
                .unwrap_or(DEFAULT_RETRIES),
            trust_all_certificates: flag(TRUST_ALL, defaults.trust_all_certificates),
            extended_debug: flag(EXTENDED_DEBUG, defaults.extended_debug),
        }
    }

    /// Serialize to the store layout.
    ///
    /// Token mode records carry no login/password keys.
    pub fn to_properties(&self) -> Properties {
        let mut props = Properties::new();
        props.insert(HOST.to_string(), self.host.clone());
        props.insert(EXTENDED_DEBUG.to_string(), self.extended_debug.to_string());
        props.insert(USE_TOKEN.to_string(), self.use_token_auth.to_string());
        if !self.use_token_auth {
            props.insert(LOGIN.to_string(), self.login.clone());
            props.insert(PASSWORD.to_string(), self.password.clone());
        }
        props.insert(AUTH_KEY.to_string(), self.auth_token.clone());
        props.insert(RETRIES.to_string(), self.retries.to_string());
        props.insert(TRUST_ALL.to_string(), self.trust_all_certificates.to_string());
        props.insert(LINKBASE.to_string(), self.linkbase.clone());
        props
    }
}

/// Append the URL separator unless already present
pub fn normalize_host(host: &str) -> String {
    if host.ends_with(URL_SEPARATOR) {
        host.to_string()
    } else {
        format!("{}{}", host, URL_SEPARATOR)
    }
}

/// Link base from the submitted value, or derived from the host without its REST segment
pub fn resolve_linkbase(submitted: Option<&str>, normalized_host: &str) -> String {
    match submitted {
        Some(linkbase) if !linkbase.is_empty() => normalize_host(linkbase),
        _ => normalize_host(&normalized_host.replace(REST_PREFIX, "")),
    }
}

/// Parse a retry count, falling back to the default on anything but a non-negative integer
pub fn parse_retries(raw: &str) -> u32 {
    raw.parse::<u32>().unwrap_or(DEFAULT_RETRIES)
}

/// Posted settings form.
///
/// Checkbox fields are presence flags: the browser omits unchecked boxes, so
/// any value (even empty) means "on".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsForm {
    pub host: Option<String>,
    pub password: Option<String>,
    pub login: Option<String>,
    #[serde(rename = "authKey")]
    pub auth_key: Option<String>,
    #[serde(rename = "useToken")]
    pub use_token: Option<String>,
    pub retries: Option<String>,
    pub linkbase: Option<String>,
    #[serde(rename = "trustAll")]
    pub trust_all: Option<String>,
    #[serde(rename = "extendedDebug")]
    pub extended_debug: Option<String>,
}

impl SettingsForm {
    /// Build the candidate config.
    ///
    /// `auth_token` holds the submitted token; in basic mode it is replaced by
    /// the session-derived token once login succeeds.
    pub fn into_candidate(self) -> IntegrationConfig {
        let host = normalize_host(self.host.as_deref().unwrap_or_default());
        let linkbase = resolve_linkbase(self.linkbase.as_deref(), &host);

        IntegrationConfig {
            linkbase,
            host,
            login: self.login.unwrap_or_default(),
            password: self.password.unwrap_or_default(),
            auth_token: self.auth_key.unwrap_or_default(),
            use_token_auth: self.use_token.is_some(),
            retries: self
                .retries
                .as_deref()
                .map(parse_retries)
                .unwrap_or(DEFAULT_RETRIES),
            trust_all_certificates: self.trust_all.is_some(),
            extended_debug: self.extended_debug.is_some(),
        }
    }
}

/// Outcome of the most recent save, as shown on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveOutcome {
    /// No save in this request
    #[default]
    Unset,
    Success,
    Failure,
}

impl SaveOutcome {
    /// Numeric code used by the page (`-1`, `0`, `-2`)
    pub fn code(self) -> i32 {
        match self {
            SaveOutcome::Unset => -1,
            SaveOutcome::Success => 0,
            SaveOutcome::Failure => -2,
        }
    }
}

/// Everything the settings page displays
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    pub base_url: String,
    pub host: String,
    pub retries: String,
    pub password: String,
    pub login: String,
    pub auth_key: String,
    pub use_token: bool,
    pub extended_debug: bool,
    pub trust_all: bool,
    pub linkbase: String,
    pub just_saved: i32,
}

impl SettingsView {
    pub fn new(base_url: &str, config: &IntegrationConfig, outcome: SaveOutcome) -> Self {
        Self {
            base_url: base_url.to_string(),
            host: config.host.clone(),
            retries: config.retries.to_string(),
            password: config.password.clone(),
            login: config.login.clone(),
            auth_key: config.auth_token.clone(),
            use_token: config.use_token_auth,
            extended_debug: config.extended_debug,
            trust_all: config.trust_all_certificates,
            linkbase: config.linkbase.clone(),
            just_saved: outcome.code(),
        }
    }
}
