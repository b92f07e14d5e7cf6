//! Remote issue-tracker client
//!
//! The settings page only needs two things from the tracker: proof that a
//! basic-auth login works, and the authorization the live session derives from
//! it. Token authorization is accepted as-is with no round trip.

mod client;

pub use client::{HttpTrackerConnector, HttpTrackerSession};

use crate::error::Result;
use async_trait::async_trait;

/// Creates tracker sessions bound to a host
pub trait TrackerConnector: Send + Sync {
    /// Build a session for `host`; `trust_all` disables certificate validation
    fn connect(&self, host: &str, trust_all: bool) -> Result<Box<dyn TrackerSession>>;
}

/// One client session against the tracker
#[async_trait]
pub trait TrackerSession: Send + Sync {
    fn set_use_token_authorization(&mut self, use_token: bool);

    /// Set the current authorization (a token in token mode)
    fn set_authorization(&mut self, authorization: &str);

    /// Log in with basic credentials, replacing the current authorization
    async fn login(&mut self, login: &str, password: &str) -> Result<()>;

    /// Authorization currently held by the session
    fn authorization(&self) -> &str;
}
