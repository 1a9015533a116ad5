//! Authorization-code OAuth client
//!
//! Builds the consent URL and performs the two token-endpoint exchanges
//! (`authorization_code` and `refresh_token`). Both are form-encoded POSTs;
//! a non-success status is mapped to an auth error carrying the provider's
//! `error`/`error_description` body when one is present.

use chatsync_domain::constants::{
    DEFAULT_AUTHORIZATION_ENDPOINT, DEFAULT_OAUTH_SCOPES, DEFAULT_REDIRECT_URI,
    DEFAULT_TOKEN_ENDPOINT,
};
use chatsync_domain::{ChatSyncError, Result, TokenSet};
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::http::HttpClient;

/// Static OAuth application configuration.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
}

impl OAuthConfig {
    /// Configuration pointing at the default provider endpoints.
    #[must_use]
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scopes: DEFAULT_OAUTH_SCOPES.iter().map(|s| (*s).to_string()).collect(),
            authorization_endpoint: DEFAULT_AUTHORIZATION_ENDPOINT.to_string(),
            token_endpoint: DEFAULT_TOKEN_ENDPOINT.to_string(),
        }
    }

    /// Whether both credential values required for an exchange are present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    /// Space-joined scope list as the authorization endpoint expects it.
    #[must_use]
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }
}

/// Success body of both token-endpoint exchanges.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

/// Error body the provider returns on a rejected exchange.
#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error: Option<String>,
    error_description: Option<String>,
}

/// Client for the provider's authorization and token endpoints.
pub struct OAuthClient {
    config: OAuthConfig,
    http: HttpClient,
}

impl OAuthClient {
    pub fn new(config: OAuthConfig) -> Result<Self> {
        let http = HttpClient::new()?;
        Ok(Self { config, http })
    }

    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Consent URL for the browser. Carries `client_id`, `redirect_uri`,
    /// the space-joined scopes, and `response_type=code`.
    #[must_use]
    pub fn authorization_url(&self) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&scope={}&response_type=code",
            self.config.authorization_endpoint,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode(&self.config.scope_string()),
        )
    }

    /// Exchange an authorization code for a token set.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenSet> {
        debug!("exchanging authorization code for tokens");
        let form = [
            ("grant_type", "authorization_code"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code", code),
        ];
        self.token_request(&form).await
    }

    /// Exchange a refresh token for a new token set.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenSet> {
        debug!("refreshing access token");
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", refresh_token),
        ];
        self.token_request(&form).await
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenSet> {
        let builder =
            self.http.request(Method::POST, &self.config.token_endpoint).form(form);
        let response = self.http.send(builder).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = match serde_json::from_str::<OAuthErrorBody>(&body) {
                Ok(parsed) => {
                    let error = parsed.error.unwrap_or_else(|| status.to_string());
                    match parsed.error_description {
                        Some(description) => format!("{error}: {description}"),
                        None => error,
                    }
                }
                Err(_) => status.to_string(),
            };
            warn!(%status, "token endpoint rejected the exchange");
            return Err(ChatSyncError::Auth(format!("token exchange failed: {detail}")));
        }

        let body: TokenResponse = response.json().await.map_err(|err| {
            ChatSyncError::Auth(format!("token endpoint returned an unreadable body: {err}"))
        })?;

        Ok(TokenSet::new(body.access_token, body.refresh_token, body.expires_in))
    }
}
