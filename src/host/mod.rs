//! Host application collaborators
//!
//! The settings endpoint never talks to user management or persistence
//! directly. It is handed these capabilities at construction:
//!
//! - [`UserManager`]: who is making the request, and are they an admin
//! - [`LoginUriProvider`]: where to send users that are not
//! - [`SettingsStore`]: atomic read/write of one named settings record
//!
//! Default implementations suitable for running behind a reverse proxy are
//! provided in [`users`] and [`store`].

pub mod store;
pub mod users;

use crate::error::Result;
use crate::settings::types::Properties;
use async_trait::async_trait;
use axum::http::HeaderMap;

pub use store::{FileSettingsStore, MemorySettingsStore};
pub use users::{HeaderUserManager, QueryLoginUriProvider};

/// Resolves the requesting user and their rights
pub trait UserManager: Send + Sync {
    /// Username of the authenticated requester, if any
    fn remote_username(&self, headers: &HeaderMap) -> Option<String>;

    /// Whether the given user has admin rights
    fn is_admin(&self, username: &str) -> bool;
}

/// Builds the host's login URI for a return URL
pub trait LoginUriProvider: Send + Sync {
    fn login_uri(&self, return_url: &str) -> String;
}

/// Host settings store.
///
/// Each call is one transaction: `read` sees a complete record or none, and
/// `write` replaces the whole record or leaves it untouched.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read the record stored under `key`
    async fn read(&self, key: &str) -> Result<Option<Properties>>;

    /// Replace the record stored under `key`
    async fn write(&self, key: &str, value: Properties) -> Result<()>;
}
