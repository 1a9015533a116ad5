//! OAuth lifecycle manager
//!
//! Single owner of the connect / refresh / disconnect state machine. Holds
//! the token store, the OAuth client, the loopback listener, and the CRM
//! client whose identity cache must be dropped whenever the token record
//! changes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chatsync_core::{ConsentBrowser, CrmApi, EventSink, TokenGate};
use chatsync_domain::constants::{CALLBACK_PORT, EVENT_DISCONNECTED, REFRESH_THRESHOLD_SECONDS};
use chatsync_domain::{ChatSyncError, Result, TokenSet};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::callback_server::CallbackServer;
use super::oauth_client::OAuthClient;
use super::token_store::TokenStore;

/// Orchestrates the OAuth token lifecycle.
pub struct OAuthManager {
    oauth: Arc<OAuthClient>,
    tokens: Arc<TokenStore>,
    crm: Arc<dyn CrmApi>,
    events: Arc<dyn EventSink>,
    browser: Arc<dyn ConsentBrowser>,
    listener: Mutex<Option<CallbackServer>>,
    callback_port: u16,
    idle_timeout: Option<Duration>,
}

impl OAuthManager {
    pub fn new(
        oauth: Arc<OAuthClient>,
        tokens: Arc<TokenStore>,
        crm: Arc<dyn CrmApi>,
        events: Arc<dyn EventSink>,
        browser: Arc<dyn ConsentBrowser>,
    ) -> Self {
        Self {
            oauth,
            tokens,
            crm,
            events,
            browser,
            listener: Mutex::new(None),
            callback_port: CALLBACK_PORT,
            idle_timeout: None,
        }
    }

    /// Override the listener port (0 picks a free port).
    #[must_use]
    pub fn with_callback_port(mut self, port: u16) -> Self {
        self.callback_port = port;
        self
    }

    /// Stop the listener automatically when no callback arrives in time.
    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Begin the consent flow: bind the loopback listener and open the
    /// provider's authorization URL in the browser.
    ///
    /// If a listener from a previous `start()` is still waiting, the flow is
    /// not restarted; the browser is simply pointed at the consent URL again.
    pub async fn start(&self) -> Result<()> {
        if self.oauth.config().client_id.is_empty() {
            return Err(ChatSyncError::Config(
                "CRM client id is not configured".to_string(),
            ));
        }

        let mut listener = self.listener.lock().await;
        let still_waiting = listener.as_ref().is_some_and(|server| !server.is_finished());

        if still_waiting {
            info!("authorization flow already in progress; reopening consent page");
        } else {
            let server = CallbackServer::start(
                self.callback_port,
                Arc::clone(&self.oauth),
                Arc::clone(&self.tokens),
                Arc::clone(&self.events),
                Arc::clone(&self.browser),
                self.idle_timeout,
            )
            .await?;
            *listener = Some(server);
        }
        drop(listener);

        self.browser.open(&self.oauth.authorization_url())
    }

    /// Stop a pending consent flow. Idempotent.
    pub async fn stop(&self) {
        if let Some(mut server) = self.listener.lock().await.take() {
            server.shutdown();
            info!("authorization flow stopped");
        }
    }

    /// Forget the connection: delete the token record, drop the CRM identity
    /// cache, and announce the disconnect.
    pub async fn disconnect(&self) -> Result<()> {
        self.stop().await;
        self.tokens.clear().await?;
        self.crm.invalidate_identity_cache().await;
        self.events.publish(EVENT_DISCONNECTED, None);
        info!("CRM connection removed");
        Ok(())
    }

    /// Current token record, if any.
    pub async fn get_tokens(&self) -> Option<TokenSet> {
        self.tokens.read().await
    }

    /// Whether a usable access token is currently held.
    pub async fn has_valid_tokens(&self) -> bool {
        self.tokens.is_valid().await
    }

    /// Refresh only when the record is close to expiry; returns whether a
    /// usable token is held afterwards.
    pub async fn refresh_token_if_needed(&self) -> bool {
        if self.tokens.needs_refresh(REFRESH_THRESHOLD_SECONDS).await {
            self.refresh_token().await
        } else {
            self.tokens.is_valid().await
        }
    }

    /// Unconditionally attempt a refresh. Returns `true` only when a new
    /// record was obtained and persisted.
    ///
    /// No network call is made when there is nothing to refresh with: a
    /// missing record, a record without a refresh token, or missing
    /// credentials all return `false` immediately. A provider rejection
    /// means the grant is gone, so the whole record is cleared and the
    /// identity cache dropped.
    pub async fn refresh_token(&self) -> bool {
        let Some(current) = self.tokens.read().await else {
            debug!("no token record to refresh");
            return false;
        };
        let Some(refresh_token) = current.refresh_token else {
            debug!("token record has no refresh token");
            return false;
        };
        if !self.oauth.config().is_configured() {
            warn!("cannot refresh: OAuth credentials are not configured");
            return false;
        }

        match self.oauth.refresh(&refresh_token).await {
            Ok(rotated) => {
                if let Err(err) = self.tokens.save(rotated).await {
                    warn!(error = %err, "refreshed tokens could not be persisted");
                    return false;
                }
                self.crm.invalidate_identity_cache().await;
                info!("access token refreshed");
                true
            }
            Err(err) => {
                warn!(error = %err, "token refresh rejected; clearing stored record");
                if let Err(clear_err) = self.tokens.clear().await {
                    warn!(error = %clear_err, "failed to clear token record after rejected refresh");
                }
                self.crm.invalidate_identity_cache().await;
                false
            }
        }
    }
}

#[async_trait]
impl TokenGate for OAuthManager {
    async fn ensure_fresh_token(&self) -> bool {
        self.refresh_token_if_needed().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    use chatsync_core::{CompanyEvent, ContactDetails, ContactEvent};
    use chatsync_domain::AuthenticatedUser;
    use chrono::{Duration as ChronoDuration, Utc};
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::super::oauth_client::OAuthConfig;
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        events: StdMutex<Vec<(String, Option<bool>)>>,
    }

    impl EventSink for RecordingSink {
        fn publish(&self, event: &str, payload: Option<bool>) {
            self.events.lock().unwrap().push((event.to_string(), payload));
        }
    }

    #[derive(Default)]
    struct RecordingBrowser {
        opened: StdMutex<Vec<String>>,
    }

    impl ConsentBrowser for RecordingBrowser {
        fn open(&self, url: &str) -> Result<()> {
            self.opened.lock().unwrap().push(url.to_string());
            Ok(())
        }

        fn close(&self) {}
    }

    #[derive(Default)]
    struct CountingCrm {
        invalidations: AtomicUsize,
    }

    #[async_trait]
    impl CrmApi for CountingCrm {
        async fn authenticated_user(&self) -> AuthenticatedUser {
            AuthenticatedUser::fallback()
        }

        async fn invalidate_identity_cache(&self) {
            self.invalidations.fetch_add(1, Ordering::SeqCst);
        }

        async fn lookup_contact_by_phone(&self, _phone: &str) -> Result<Option<String>> {
            Ok(None)
        }

        async fn lookup_contact_by_email(&self, _email: &str) -> Result<Option<String>> {
            Ok(None)
        }

        async fn contact_details(&self, _contact_id: &str) -> Result<Option<ContactDetails>> {
            Ok(None)
        }

        async fn associated_company_id(&self, _contact_id: &str) -> Result<Option<String>> {
            Ok(None)
        }

        async fn post_contact_event(&self, _event: &ContactEvent) -> Result<Option<String>> {
            Ok(None)
        }

        async fn post_company_event(&self, _event: &CompanyEvent) -> Result<bool> {
            Ok(false)
        }
    }

    struct Fixture {
        manager: OAuthManager,
        tokens: Arc<TokenStore>,
        crm: Arc<CountingCrm>,
        sink: Arc<RecordingSink>,
        browser: Arc<RecordingBrowser>,
        _dir: TempDir,
    }

    fn fixture(token_endpoint: Option<String>, client_id: &str) -> Fixture {
        let dir = TempDir::new().unwrap();
        let tokens = Arc::new(TokenStore::new(dir.path().join("crm_tokens.json")));
        let mut config = OAuthConfig::new(client_id.to_string(), "secret".to_string());
        if let Some(endpoint) = token_endpoint {
            config.token_endpoint = endpoint;
        }
        let oauth = Arc::new(OAuthClient::new(config).unwrap());
        let crm = Arc::new(CountingCrm::default());
        let sink = Arc::new(RecordingSink::default());
        let browser = Arc::new(RecordingBrowser::default());

        let manager = OAuthManager::new(
            oauth,
            Arc::clone(&tokens),
            Arc::clone(&crm) as Arc<dyn CrmApi>,
            Arc::clone(&sink) as Arc<dyn EventSink>,
            Arc::clone(&browser) as Arc<dyn ConsentBrowser>,
        )
        .with_callback_port(0);

        Fixture { manager, tokens, crm, sink, browser, _dir: dir }
    }

    fn refreshable_tokens() -> TokenSet {
        TokenSet::new("old-access".to_string(), Some("old-refresh".to_string()), Some(3600))
    }

    #[tokio::test]
    async fn start_without_client_id_is_a_config_error() {
        let f = fixture(None, "");
        let result = f.manager.start().await;
        assert!(matches!(result, Err(ChatSyncError::Config(_))));
        assert!(f.browser.opened.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn start_binds_listener_and_opens_browser() {
        let f = fixture(None, "client-id");
        f.manager.start().await.expect("start");

        let opened = f.browser.opened.lock().unwrap().clone();
        assert_eq!(opened.len(), 1);
        assert!(opened[0].contains("client_id=client-id"));
        assert!(opened[0].contains("response_type=code"));

        f.manager.stop().await;
    }

    #[tokio::test]
    async fn second_start_reuses_the_waiting_listener() {
        let f = fixture(None, "client-id");
        f.manager.start().await.expect("first start");
        f.manager.start().await.expect("second start");

        // The browser is opened once per call, but only one listener exists.
        assert_eq!(f.browser.opened.lock().unwrap().len(), 2);
        f.manager.stop().await;
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let f = fixture(None, "client-id");
        f.manager.stop().await;
        f.manager.start().await.expect("start");
        f.manager.stop().await;
        f.manager.stop().await;
    }

    #[tokio::test]
    async fn disconnect_clears_store_and_notifies() {
        let f = fixture(None, "client-id");
        f.tokens.save(refreshable_tokens()).await.unwrap();

        f.manager.disconnect().await.expect("disconnect");

        assert_eq!(f.tokens.read().await, None);
        assert_eq!(f.crm.invalidations.load(Ordering::SeqCst), 1);
        let events = f.sink.events.lock().unwrap().clone();
        assert_eq!(events, vec![(EVENT_DISCONNECTED.to_string(), None)]);
    }

    #[tokio::test]
    async fn refresh_rotates_tokens_and_drops_identity_cache() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/v1/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=old-refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "new-access",
                "refresh_token": "new-refresh",
                "expires_in": 1800
            })))
            .expect(1)
            .mount(&server)
            .await;

        let f = fixture(Some(format!("{}/oauth/v1/token", server.uri())), "client-id");
        f.tokens.save(refreshable_tokens()).await.unwrap();

        assert!(f.manager.refresh_token().await);

        let stored = f.tokens.read().await.expect("record present");
        assert_eq!(stored.access_token, "new-access");
        assert_eq!(stored.refresh_token.as_deref(), Some("new-refresh"));
        assert_eq!(f.crm.invalidations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rejected_refresh_clears_the_whole_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let f = fixture(Some(format!("{}/oauth/v1/token", server.uri())), "client-id");
        f.tokens.save(refreshable_tokens()).await.unwrap();

        assert!(!f.manager.refresh_token().await);
        assert_eq!(f.tokens.read().await, None);
        assert!(!f.manager.has_valid_tokens().await);
        assert_eq!(f.crm.invalidations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refresh_without_refresh_token_skips_the_network() {
        // No mock server at all: a network call would hang or fail loudly.
        let f = fixture(Some("http://127.0.0.1:9/oauth/v1/token".to_string()), "client-id");
        f.tokens
            .save(TokenSet::new("access-only".to_string(), None, Some(3600)))
            .await
            .unwrap();

        assert!(!f.manager.refresh_token().await);
        // The existing record is untouched.
        assert!(f.tokens.read().await.is_some());
    }

    #[tokio::test]
    async fn refresh_with_empty_store_returns_false() {
        let f = fixture(None, "client-id");
        assert!(!f.manager.refresh_token().await);
    }

    #[tokio::test]
    async fn ensure_fresh_token_passes_through_a_healthy_record() {
        let f = fixture(None, "client-id");
        f.tokens.save(refreshable_tokens()).await.unwrap();

        // Plenty of lifetime left: no refresh, token reported usable.
        assert!(f.manager.ensure_fresh_token().await);
    }

    #[tokio::test]
    async fn ensure_fresh_token_refreshes_near_expiry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/v1/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "rotated",
                "refresh_token": "rotated-refresh",
                "expires_in": 1800
            })))
            .expect(1)
            .mount(&server)
            .await;

        let f = fixture(Some(format!("{}/oauth/v1/token", server.uri())), "client-id");
        let near_expiry = TokenSet {
            access_token: "old".to_string(),
            refresh_token: Some("old-refresh".to_string()),
            expires_in: Some(3600),
            issued_at: Utc::now() - ChronoDuration::seconds(3500),
        };
        f.tokens.save(near_expiry).await.unwrap();

        assert!(f.manager.ensure_fresh_token().await);
        assert_eq!(f.tokens.read().await.unwrap().access_token, "rotated");
    }

    #[tokio::test]
    async fn ensure_fresh_token_is_false_without_a_record() {
        let f = fixture(None, "client-id");
        assert!(!f.manager.ensure_fresh_token().await);
    }
}
