//! Settings module: tracker integration settings page
//!
//! Renders the admin-only settings form, validates posted credentials against
//! the remote tracker, and persists the result in the host settings store.

pub mod handler;
pub mod render;
pub mod types;

pub use handler::{settings_router, validate_with_tracker, SettingsState};
pub use render::{HtmlRenderer, Renderer};
pub use types::{IntegrationConfig, SaveOutcome, SettingsForm, SettingsView, SETTINGS_KEY};
