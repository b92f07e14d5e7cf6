//! HTTP handlers for the tracker integration settings page
//!
//! One path, two verbs:
//! - GET: render the stored settings
//! - POST: validate the posted settings against the tracker, save them, and
//!   render the page with the outcome
//!
//! Both require an admin; anyone else is redirected to the host's login page.
//! The save outcome is passed straight from the save step to the render step
//! of the same request, so concurrent admins never see each other's result.

use crate::error::{Error, Result};
use crate::host::{LoginUriProvider, SettingsStore, UserManager};
use crate::settings::render::Renderer;
use crate::settings::types::*;
use crate::tracker::TrackerConnector;
use axum::{
    extract::{OriginalUri, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Form, Router,
};
use std::sync::Arc;

/// Shared state for the settings handlers
#[derive(Clone)]
pub struct SettingsState {
    pub users: Arc<dyn UserManager>,
    pub login_uris: Arc<dyn LoginUriProvider>,
    pub store: Arc<dyn SettingsStore>,
    pub tracker: Arc<dyn TrackerConnector>,
    pub renderer: Arc<dyn Renderer>,
    /// Host application base URL shown on the page
    pub base_url: String,
}

/// Create the settings router mounted at `path`
pub fn settings_router(path: &str, state: SettingsState) -> Router {
    Router::new()
        .route(path, get(view_settings).post(save_settings))
        .with_state(state)
}

// =============================================================================
// Handlers
// =============================================================================

/// GET <settings path>
async fn view_settings(
    State(state): State<SettingsState>,
    headers: HeaderMap,
    OriginalUri(uri): OriginalUri,
) -> Response {
    if let Err(redirect) = require_admin(&state, &headers, &uri) {
        return redirect;
    }
    render_page(&state, SaveOutcome::Unset).await
}

/// POST <settings path>
async fn save_settings(
    State(state): State<SettingsState>,
    headers: HeaderMap,
    OriginalUri(uri): OriginalUri,
    form: Option<Form<SettingsForm>>,
) -> Response {
    let username = match require_admin(&state, &headers, &uri) {
        Ok(username) => username,
        Err(redirect) => return redirect,
    };

    let form = form.map(|Form(form)| form).unwrap_or_default();
    let outcome = apply_settings(&state, form).await;
    tracing::info!(user = %username, outcome = ?outcome, "Tracker settings save attempted");
    render_page(&state, outcome).await
}

// =============================================================================
// Helpers
// =============================================================================

/// Username of the admin making the request, or the login redirect
fn require_admin(
    state: &SettingsState,
    headers: &HeaderMap,
    uri: &Uri,
) -> std::result::Result<String, Response> {
    match state.users.remote_username(headers) {
        Some(username) if state.users.is_admin(&username) => Ok(username),
        username => {
            tracing::debug!(
                user = ?username,
                path = %uri.path(),
                "Non-admin access to tracker settings"
            );
            let location = state.login_uris.login_uri(&request_url(headers, uri));
            Err((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
        }
    }
}

/// Full URL of the request including its query string
fn request_url(headers: &HeaderMap, uri: &Uri) -> String {
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());

    let authority = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| uri.authority().map(|a| a.to_string()));

    match authority {
        Some(authority) => {
            let scheme = headers
                .get("x-forwarded-proto")
                .and_then(|v| v.to_str().ok())
                .or_else(|| uri.scheme_str())
                .unwrap_or("http");
            format!("{}://{}{}", scheme, authority, path_and_query)
        }
        None => path_and_query.to_string(),
    }
}

/// Validate and persist posted settings
async fn apply_settings(state: &SettingsState, form: SettingsForm) -> SaveOutcome {
    let candidate = form.into_candidate();
    let host = candidate.host.clone();

    let config = match validate_with_tracker(state.tracker.as_ref(), candidate).await {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(host = %host, error = %e, "Tracker integration login failed");
            return SaveOutcome::Failure;
        }
    };

    match state.store.write(SETTINGS_KEY, config.to_properties()).await {
        Ok(()) => {
            tracing::info!(
                host = %config.host,
                token_auth = config.use_token_auth,
                retries = config.retries,
                "Tracker integration settings saved"
            );
            SaveOutcome::Success
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to store tracker integration settings");
            SaveOutcome::Failure
        }
    }
}

/// Check the candidate against the tracker.
///
/// Token mode trusts the submitted token without a round trip, but the token
/// must be present. Basic mode logs in and replaces the token with the one
/// derived by the live session.
pub async fn validate_with_tracker(
    tracker: &dyn TrackerConnector,
    mut candidate: IntegrationConfig,
) -> Result<IntegrationConfig> {
    if candidate.use_token_auth && candidate.auth_token.is_empty() {
        return Err(Error::Tracker(
            "Token authorization selected but no token was given".to_string(),
        ));
    }

    let mut session = tracker.connect(&candidate.host, candidate.trust_all_certificates)?;
    session.set_use_token_authorization(candidate.use_token_auth);
    session.set_authorization(&candidate.auth_token);

    if !candidate.use_token_auth {
        session.login(&candidate.login, &candidate.password).await?;
        candidate.auth_token = session.authorization().to_string();
    }

    Ok(candidate)
}

/// Read the stored settings and render the page
async fn render_page(state: &SettingsState, outcome: SaveOutcome) -> Response {
    let config = match state.store.read(SETTINGS_KEY).await {
        Ok(Some(props)) => IntegrationConfig::from_properties(&props),
        Ok(None) => IntegrationConfig::default(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read tracker integration settings");
            IntegrationConfig::default()
        }
    };

    let view = SettingsView::new(&state.base_url, &config, outcome);
    let body = state.renderer.render(&view);
    ([(header::CONTENT_TYPE, "text/html;charset=utf-8")], body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HeaderUserManager, MemorySettingsStore, QueryLoginUriProvider};
    use crate::settings::render::HtmlRenderer;
    use crate::tracker::{HttpTrackerConnector, TrackerSession};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    const PATH: &str = "/plugins/servlet/tracker/settings";
    const DERIVED: &str = "JSESSIONID=derived";

    /// Accepts password "good"; derives `DERIVED` on login
    #[derive(Default)]
    struct StubTracker {
        connects: AtomicUsize,
        logins: Arc<AtomicUsize>,
    }

    struct StubSession {
        authorization: String,
        logins: Arc<AtomicUsize>,
    }

    impl TrackerConnector for StubTracker {
        fn connect(&self, host: &str, _trust_all: bool) -> Result<Box<dyn TrackerSession>> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            if !host.starts_with("http") {
                return Err(Error::Tracker(format!("bad host {}", host)));
            }
            Ok(Box::new(StubSession {
                authorization: String::new(),
                logins: self.logins.clone(),
            }))
        }
    }

    #[async_trait]
    impl TrackerSession for StubSession {
        fn set_use_token_authorization(&mut self, _use_token: bool) {}

        fn set_authorization(&mut self, authorization: &str) {
            self.authorization = authorization.to_string();
        }

        async fn login(&mut self, _login: &str, password: &str) -> Result<()> {
            self.logins.fetch_add(1, Ordering::SeqCst);
            if password == "good" {
                self.authorization = DERIVED.to_string();
                Ok(())
            } else {
                Err(Error::Tracker("Login rejected with status 403 Forbidden".to_string()))
            }
        }

        fn authorization(&self) -> &str {
            &self.authorization
        }
    }

    struct Harness {
        app: Router,
        store: Arc<MemorySettingsStore>,
        tracker: Arc<StubTracker>,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemorySettingsStore::new());
        let tracker = Arc::new(StubTracker::default());
        let state = SettingsState {
            users: Arc::new(HeaderUserManager::new(
                "x-remote-user",
                vec!["alice".to_string(), "bob".to_string()],
            )),
            login_uris: Arc::new(QueryLoginUriProvider::new("/login", "os_destination")),
            store: store.clone(),
            tracker: tracker.clone(),
            renderer: Arc::new(HtmlRenderer),
            base_url: "https://wiki.example.com".to_string(),
        };
        Harness {
            app: settings_router(PATH, state),
            store,
            tracker,
        }
    }

    fn get_as(user: Option<&str>, uri: &str) -> Request<Body> {
        let mut builder = Request::builder().uri(uri).header("host", "wiki.example.com");
        if let Some(user) = user {
            builder = builder.header("x-remote-user", user);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_as(user: &str, form: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(PATH)
            .header("host", "wiki.example.com")
            .header("x-remote-user", user)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), 1024 * 64)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    async fn stored(store: &MemorySettingsStore) -> Option<Properties> {
        store.read(SETTINGS_KEY).await.unwrap()
    }

    #[tokio::test]
    async fn test_get_non_admin_redirects_to_login() {
        let h = harness();
        let resp = h
            .app
            .oneshot(get_as(Some("mallory"), &format!("{}?tab=auth&x=1", PATH)))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::FOUND);
        let location = resp.headers()[header::LOCATION].to_str().unwrap();
        assert_eq!(
            location,
            format!(
                "/login?os_destination={}",
                urlencoding::encode(&format!("http://wiki.example.com{}?tab=auth&x=1", PATH))
            )
        );
    }

    #[tokio::test]
    async fn test_get_anonymous_redirects_to_login() {
        let h = harness();
        let resp = h.app.oneshot(get_as(None, PATH)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert!(resp.headers()[header::LOCATION]
            .to_str()
            .unwrap()
            .starts_with("/login?os_destination=http%3A%2F%2Fwiki.example.com"));
    }

    #[tokio::test]
    async fn test_get_admin_renders_defaults() {
        let h = harness();
        let resp = h.app.oneshot(get_as(Some("alice"), PATH)).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE],
            "text/html;charset=utf-8"
        );
        let page = body_text(resp).await;
        assert!(page.contains("data-just-saved=\"-1\""));
        assert!(page.contains("data-base-url=\"https://wiki.example.com\""));
        assert!(page.contains("name=\"retries\" value=\"10\""));
        assert!(page.contains("name=\"useToken\" checked"));
        assert!(page.contains("name=\"trustAll\">"));
    }

    #[tokio::test]
    async fn test_post_non_admin_redirects_without_saving() {
        let h = harness();
        let resp = h
            .app
            .oneshot(post_as("mallory", "host=http%3A%2F%2Fyt&useToken=on&authKey=t"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(h.tracker.connects.load(Ordering::SeqCst), 0);
        assert!(stored(&h.store).await.is_none());
    }

    #[tokio::test]
    async fn test_token_save_then_view_roundtrip() {
        let h = harness();
        let form = "host=https%3A%2F%2Fyt.example.com&login=root&password=pw\
                    &authKey=perm%3Aabc&useToken=on&retries=5&extendedDebug=on";
        let resp = h.app.clone().oneshot(post_as("alice", form)).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let page = body_text(resp).await;
        assert!(page.contains("data-just-saved=\"0\""));
        assert_eq!(h.tracker.logins.load(Ordering::SeqCst), 0);

        let props = stored(&h.store).await.unwrap();
        assert_eq!(props[HOST], "https://yt.example.com/");
        assert_eq!(props[LINKBASE], "https://yt.example.com/");
        assert_eq!(props[AUTH_KEY], "perm:abc");
        assert_eq!(props[RETRIES], "5");
        assert_eq!(props[EXTENDED_DEBUG], "true");
        assert_eq!(props[TRUST_ALL], "false");

        let config = IntegrationConfig::from_properties(&props);
        assert!(config.login.is_empty());
        assert!(config.password.is_empty());

        let page = body_text(h.app.oneshot(get_as(Some("alice"), PATH)).await.unwrap()).await;
        assert!(page.contains("data-just-saved=\"-1\""));
        assert!(page.contains("name=\"authKey\" value=\"perm:abc\""));
        assert!(page.contains("name=\"login\" value=\"\""));
        assert!(page.contains("name=\"password\" value=\"\""));
    }

    #[tokio::test]
    async fn test_token_save_without_token_fails() {
        for form in [
            "host=https%3A%2F%2Fyt&useToken=on",
            "host=https%3A%2F%2Fyt&useToken=on&authKey=",
        ] {
            let h = harness();
            let resp = h.app.oneshot(post_as("alice", form)).await.unwrap();

            assert_eq!(resp.status(), StatusCode::OK);
            assert!(body_text(resp).await.contains("data-just-saved=\"-2\""));
            assert!(stored(&h.store).await.is_none(), "form {:?}", form);
            assert_eq!(h.tracker.connects.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_basic_save_stores_derived_token() {
        let h = harness();
        let form = "host=https%3A%2F%2Fyt.example.com%2Frest&login=root&password=good\
                    &authKey=user-supplied&retries=3&trustAll=on";
        let resp = h.app.oneshot(post_as("alice", form)).await.unwrap();

        assert!(body_text(resp).await.contains("data-just-saved=\"0\""));
        let props = stored(&h.store).await.unwrap();
        assert_eq!(props[AUTH_KEY], DERIVED);
        assert_ne!(props[AUTH_KEY], "good");
        assert_eq!(props[LOGIN], "root");
        assert_eq!(props[PASSWORD], "good");
        assert_eq!(props[USE_TOKEN], "false");
        assert_eq!(props[TRUST_ALL], "true");
        assert_eq!(props[HOST], "https://yt.example.com/rest/");
        assert_eq!(props[LINKBASE], "https://yt.example.com/");
    }

    #[tokio::test]
    async fn test_failed_login_keeps_previous_settings() {
        let h = harness();
        let good = "host=https%3A%2F%2Fyt.example.com&useToken=on&authKey=perm%3Akeep&retries=2";
        h.app.clone().oneshot(post_as("alice", good)).await.unwrap();
        let before = stored(&h.store).await.unwrap();

        let bad = "host=https%3A%2F%2Fother.example.com&login=a&password=bad&retries=9";
        let resp = h.app.clone().oneshot(post_as("alice", bad)).await.unwrap();
        let page = body_text(resp).await;
        assert!(page.contains("data-just-saved=\"-2\""));
        assert!(page.contains("name=\"host\" value=\"https://yt.example.com/\""));

        assert_eq!(stored(&h.store).await.unwrap(), before);

        let page = body_text(h.app.oneshot(get_as(Some("alice"), PATH)).await.unwrap()).await;
        assert!(page.contains("data-just-saved=\"-1\""));
        assert!(page.contains("name=\"authKey\" value=\"perm:keep\""));
    }

    #[tokio::test]
    async fn test_malformed_retries_fall_back_to_default() {
        for raw in ["-5", "abc", "", "2.5"] {
            let h = harness();
            let form = format!(
                "host=https%3A%2F%2Fyt&useToken=on&authKey=t&retries={}",
                urlencoding::encode(raw)
            );
            h.app.oneshot(post_as("alice", &form)).await.unwrap();
            assert_eq!(stored(&h.store).await.unwrap()[RETRIES], "10", "input {:?}", raw);
        }
    }

    #[tokio::test]
    async fn test_malformed_host_is_rejected_with_real_client() {
        let store = Arc::new(MemorySettingsStore::new());
        let state = SettingsState {
            users: Arc::new(HeaderUserManager::new("x-remote-user", vec!["alice".to_string()])),
            login_uris: Arc::new(QueryLoginUriProvider::new("/login", "next")),
            store: store.clone(),
            tracker: Arc::new(HttpTrackerConnector::new()),
            renderer: Arc::new(HtmlRenderer),
            base_url: String::new(),
        };
        let app = settings_router(PATH, state);

        let resp = app
            .oneshot(post_as("alice", "host=not+a+url&useToken=on&authKey=t"))
            .await
            .unwrap();
        assert!(body_text(resp).await.contains("data-just-saved=\"-2\""));
        assert!(stored(&store).await.is_none());
    }

    #[tokio::test]
    async fn test_missing_form_body_fails_validation() {
        let h = harness();
        let req = Request::builder()
            .method("POST")
            .uri(PATH)
            .header("x-remote-user", "alice")
            .body(Body::empty())
            .unwrap();
        let resp = h.app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("data-just-saved=\"-2\""));
        assert!(stored(&h.store).await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_saves_each_see_own_outcome() {
        let h = harness();
        let ok = post_as("alice", "host=https%3A%2F%2Fyt&login=alice&password=good");
        let bad = post_as("bob", "host=https%3A%2F%2Fyt&login=bob&password=bad");

        let (ok_resp, bad_resp) =
            tokio::join!(h.app.clone().oneshot(ok), h.app.clone().oneshot(bad));

        assert!(body_text(ok_resp.unwrap()).await.contains("data-just-saved=\"0\""));
        assert!(body_text(bad_resp.unwrap()).await.contains("data-just-saved=\"-2\""));
        assert_eq!(stored(&h.store).await.unwrap()[LOGIN], "alice");

        // a later plain view from either admin shows no outcome
        let page = body_text(h.app.oneshot(get_as(Some("bob"), PATH)).await.unwrap()).await;
        assert!(page.contains("data-just-saved=\"-1\""));
    }

    #[test]
    fn test_request_url_without_host_header() {
        let uri: Uri = "/settings?a=b".parse().unwrap();
        assert_eq!(request_url(&HeaderMap::new(), &uri), "/settings?a=b");
    }

    #[test]
    fn test_request_url_forwarded_proto() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "wiki.example.com".parse().unwrap());
        headers.insert("x-forwarded-proto", "https".parse().unwrap());
        let uri: Uri = "/settings".parse().unwrap();
        assert_eq!(request_url(&headers, &uri), "https://wiki.example.com/settings");
    }
}
