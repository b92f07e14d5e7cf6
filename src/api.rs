//! Unified API router for Trackerlink
//!
//! Wires the configured host collaborators into the settings page and adds a
//! health check and request tracing.
//!
//! ## Endpoint Map
//!
//! | Path                   | Description                           |
//! |------------------------|---------------------------------------|
//! | `/health`              | Load balancer health check            |
//! | `server.settings_path` | Settings page (GET view, POST save)   |

use crate::config::ServerConfig;
use crate::error::Result;
use crate::host::{
    FileSettingsStore, HeaderUserManager, MemorySettingsStore, QueryLoginUriProvider,
    SettingsStore,
};
use crate::settings::{settings_router, HtmlRenderer, SettingsState};
use crate::tracker::HttpTrackerConnector;
use axum::{response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

/// Build the complete Trackerlink HTTP application
pub fn build_app(settings_path: &str, settings_state: SettingsState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(settings_router(settings_path, settings_state))
        .layer(TraceLayer::new_for_http())
}

/// Build settings handler state from configuration
pub async fn build_settings_state(config: &ServerConfig) -> Result<SettingsState> {
    let store: Arc<dyn SettingsStore> = match &config.storage.settings_file {
        Some(path) => Arc::new(FileSettingsStore::open(path.clone()).await?),
        None => {
            tracing::warn!("No settings file configured; settings will not survive a restart");
            Arc::new(MemorySettingsStore::new())
        }
    };

    let mut tracker = HttpTrackerConnector::new();
    if let Some(secs) = config.tracker.connect_timeout_secs {
        tracker = tracker.with_connect_timeout(Duration::from_secs(secs));
    }

    Ok(SettingsState {
        users: Arc::new(HeaderUserManager::from_config(&config.auth)),
        login_uris: Arc::new(QueryLoginUriProvider::from_config(&config.auth)),
        store,
        tracker: Arc::new(tracker),
        renderer: Arc::new(HtmlRenderer),
        base_url: config.server.base_url.clone(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
