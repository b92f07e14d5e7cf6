//! Trackerlink - issue tracker integration settings for a plugin host
//!
//! Serves the admin-only settings page of an issue-tracker integration. The
//! page shows the stored connection settings; posting it validates the new
//! credentials against the tracker and, only if that succeeds, replaces the
//! stored record.
//!
//! ## Architecture
//!
//! ```text
//! request ─► admin check ─► (POST) parse form ─► tracker login ─► store write
//!               │                                                    │
//!               └─ redirect to login                render page ◄────┘
//! ```
//!
//! ## Modules
//!
//! - [`settings`]: Settings record, form parsing, page rendering, HTTP handlers
//! - [`host`]: Host collaborators (users, login redirects, settings store)
//! - [`tracker`]: Remote tracker client used to validate credentials
//! - [`api`]: Router assembly
//! - [`config`]: Server configuration

pub mod api;
pub mod config;
pub mod error;
pub mod host;
pub mod settings;
pub mod tracker;

pub use config::ServerConfig;
pub use error::{Error, Result};
