//! Application context - dependency injection container

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chatsync_core::{ConsentBrowser, CrmApi, EventSink, SyncService, TokenGate};
use chatsync_domain::constants::{APP_DATA_DIR, DEFAULT_API_BASE_URL};
use chatsync_domain::Result;
use chatsync_infra::{
    load_credentials, load_event_templates, CrmClient, JsonSettingsStore, OAuthClient,
    OAuthConfig, OAuthManager, TokenStore,
};
use tracing::info;

use crate::adapters::{LogEventSink, SystemBrowser};

/// Overridable wiring knobs. Production uses the defaults; tests point the
/// context at mock servers and temporary directories.
#[derive(Default)]
pub struct AppContextOptions {
    pub token_path: Option<PathBuf>,
    pub settings_path: Option<PathBuf>,
    pub api_base_url: Option<String>,
    pub token_endpoint: Option<String>,
    pub authorization_endpoint: Option<String>,
    pub callback_port: Option<u16>,
    pub callback_idle_timeout: Option<Duration>,
    pub event_sink: Option<Arc<dyn EventSink>>,
    pub consent_browser: Option<Arc<dyn ConsentBrowser>>,
}

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub tokens: Arc<TokenStore>,
    pub crm: Arc<CrmClient>,
    pub oauth: Arc<OAuthManager>,
    pub sync: Arc<SyncService>,
}

impl AppContext {
    /// Wire the full service graph with production defaults.
    pub async fn new() -> Result<Arc<Self>> {
        Self::with_options(AppContextOptions::default()).await
    }

    /// Wire the service graph with explicit overrides.
    pub async fn with_options(options: AppContextOptions) -> Result<Arc<Self>> {
        let settings_path = options.settings_path.unwrap_or_else(default_settings_path);
        let settings = JsonSettingsStore::load(&settings_path);
        let credentials = load_credentials(&settings);
        let templates = load_event_templates();

        let mut config = OAuthConfig::new(credentials.client_id, credentials.client_secret);
        if let Some(endpoint) = options.authorization_endpoint {
            config.authorization_endpoint = endpoint;
        }
        if let Some(endpoint) = options.token_endpoint {
            config.token_endpoint = endpoint;
        }

        let tokens =
            Arc::new(TokenStore::new(options.token_path.unwrap_or_else(TokenStore::default_path)));
        let restored = tokens.load().await;

        let oauth_client = Arc::new(OAuthClient::new(config)?);
        let base_url = options.api_base_url.unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let crm = Arc::new(CrmClient::new(base_url, Arc::clone(&tokens), templates)?);

        let events: Arc<dyn EventSink> =
            options.event_sink.unwrap_or_else(|| Arc::new(LogEventSink));
        let browser: Arc<dyn ConsentBrowser> =
            options.consent_browser.unwrap_or_else(|| Arc::new(SystemBrowser));

        let mut manager = OAuthManager::new(
            oauth_client,
            Arc::clone(&tokens),
            Arc::clone(&crm) as Arc<dyn CrmApi>,
            events,
            browser,
        );
        if let Some(port) = options.callback_port {
            manager = manager.with_callback_port(port);
        }
        if let Some(timeout) = options.callback_idle_timeout {
            manager = manager.with_idle_timeout(timeout);
        }
        let oauth = Arc::new(manager);

        let sync = Arc::new(SyncService::new(
            Arc::clone(&crm) as Arc<dyn CrmApi>,
            Arc::clone(&oauth) as Arc<dyn TokenGate>,
        ));

        info!(restored_tokens = restored, "application context initialized");

        Ok(Arc::new(Self { tokens, crm, oauth, sync }))
    }
}

fn default_settings_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DATA_DIR)
        .join("settings.json")
}
