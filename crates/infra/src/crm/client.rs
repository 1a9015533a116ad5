//! CRM REST client
//!
//! Bearer-authenticated wrapper over the provider's contact, association,
//! timeline, and introspection endpoints. Failure policy mirrors what the
//! sync pipeline expects:
//! - a missing access token is `ChatSyncError::Auth` (callers short-circuit);
//! - provider rejections and unexpected response shapes are soft failures:
//!   lookups answer `Ok(None)` and posts answer a falsy value, with a
//!   warning logged, so a flaky CRM never breaks message handling.
//!
//! The authenticated user's identity is the only cached state; it is dropped
//! whenever the token record changes.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chatsync_core::{CompanyEvent, CompanyId, ContactDetails, ContactEvent, ContactId, CrmApi};
use chatsync_domain::constants::COMPANY_SNIPPET_MAX_CHARS;
use chatsync_domain::{AuthenticatedUser, ChatSyncError, Result};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::auth::TokenStore;
use crate::config::EventTemplates;
use crate::http::HttpClient;

use super::types::{
    AccessTokenInfo, AssociationsResponse, ContactResponse, SearchRequest, SearchResponse,
    TimelineEventRequest, TimelineEventResponse, UserSettingsResponse,
};

#[derive(Debug, Clone)]
struct CachedIdentity {
    user: AuthenticatedUser,
    portal_id: Option<i64>,
}

/// Client for the provider's REST surface.
pub struct CrmClient {
    base_url: String,
    http: HttpClient,
    tokens: Arc<TokenStore>,
    templates: EventTemplates,
    identity: RwLock<Option<CachedIdentity>>,
}

impl CrmClient {
    pub fn new(base_url: String, tokens: Arc<TokenStore>, templates: EventTemplates) -> Result<Self> {
        let http = HttpClient::new()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            tokens,
            templates,
            identity: RwLock::new(None),
        })
    }

    async fn access_token(&self) -> Result<String> {
        match self.tokens.read().await {
            Some(tokens) if !tokens.access_token.is_empty() => Ok(tokens.access_token),
            _ => Err(ChatSyncError::Auth("no CRM access token available".to_string())),
        }
    }

    /// GET `path` and decode the JSON body. Network failures, non-success
    /// statuses, and undecodable bodies all answer `None`.
    async fn get_json<T: DeserializeOwned>(&self, token: &str, path: &str, what: &str) -> Option<T> {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.http.request(Method::GET, &url).bearer_auth(token);
        self.decode(self.http.send(builder).await, what).await
    }

    /// POST a JSON body to `path` and decode the answer, same soft-failure
    /// policy as [`CrmClient::get_json`].
    async fn post_json<T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        body: &impl serde::Serialize,
        what: &str,
    ) -> Option<T> {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.http.request(Method::POST, &url).bearer_auth(token).json(body);
        self.decode(self.http.send(builder).await, what).await
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        response: Result<reqwest::Response>,
        what: &str,
    ) -> Option<T> {
        let response = match response {
            Ok(response) => response,
            Err(err) => {
                warn!(operation = what, error = %err, "CRM request failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            if status == StatusCode::NOT_FOUND {
                debug!(operation = what, "CRM object not found");
            } else {
                warn!(operation = what, %status, "CRM request rejected");
            }
            return None;
        }

        match response.json::<T>().await {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(operation = what, error = %err, "CRM response body was not in the expected shape");
                None
            }
        }
    }

    async fn search_contact(&self, property: &str, value: &str) -> Result<Option<ContactId>> {
        let token = self.access_token().await?;
        let request = SearchRequest::exact_match(property, value);
        let response: Option<SearchResponse> = self
            .post_json(&token, "/crm/v3/objects/contacts/search", &request, "contact search")
            .await;

        Ok(response.and_then(|body| body.results.into_iter().next().map(|result| result.id)))
    }

    /// Introspect the current token and, when possible, enrich the identity
    /// with the user's full name from the settings endpoint.
    async fn resolve_identity(&self) -> CachedIdentity {
        let Ok(token) = self.access_token().await else {
            return CachedIdentity { user: AuthenticatedUser::fallback(), portal_id: None };
        };

        let info: Option<AccessTokenInfo> = self
            .get_json(&token, &format!("/oauth/v1/access-tokens/{token}"), "token introspection")
            .await;
        let Some(info) = info else {
            return CachedIdentity { user: AuthenticatedUser::fallback(), portal_id: None };
        };

        let email = info.user.clone();
        let settings: Option<UserSettingsResponse> = match info.user_id {
            Some(user_id) => {
                self.get_json(&token, &format!("/settings/v3/users/{user_id}"), "user settings")
                    .await
            }
            None => None,
        };

        let display_name = settings
            .and_then(|user| match (user.first_name, user.last_name) {
                (Some(first), Some(last)) => Some(format!("{first} {last}")),
                (Some(first), None) => Some(first),
                (None, Some(last)) => Some(last),
                (None, None) => user.email,
            })
            .or_else(|| email.clone())
            .unwrap_or_else(|| AuthenticatedUser::fallback().display_name);

        CachedIdentity { user: AuthenticatedUser { display_name, email }, portal_id: info.hub_id }
    }

    async fn cached_identity(&self) -> CachedIdentity {
        if let Some(cached) = self.identity.read().await.clone() {
            return cached;
        }

        let resolved = self.resolve_identity().await;
        *self.identity.write().await = Some(resolved.clone());
        resolved
    }

    fn direction_label(is_inbound: bool) -> &'static str {
        if is_inbound {
            "Received"
        } else {
            "Sent"
        }
    }
}

/// Truncate to at most `max_chars` characters, marking the cut.
fn snippet(text: &str, max_chars: usize) -> String {
    let mut taken: String = text.chars().take(max_chars).collect();
    if taken.len() < text.len() {
        taken.push_str("...");
    }
    taken
}

#[async_trait]
impl CrmApi for CrmClient {
    async fn authenticated_user(&self) -> AuthenticatedUser {
        self.cached_identity().await.user
    }

    async fn invalidate_identity_cache(&self) {
        *self.identity.write().await = None;
        debug!("CRM identity cache invalidated");
    }

    async fn lookup_contact_by_phone(&self, phone: &str) -> Result<Option<ContactId>> {
        self.search_contact("phone", phone).await
    }

    async fn lookup_contact_by_email(&self, email: &str) -> Result<Option<ContactId>> {
        self.search_contact("email", email).await
    }

    async fn contact_details(&self, contact_id: &str) -> Result<Option<ContactDetails>> {
        let token = self.access_token().await?;
        let path =
            format!("/crm/v3/objects/contacts/{contact_id}?properties=firstname,lastname,email");
        let response: Option<ContactResponse> =
            self.get_json(&token, &path, "contact read").await;

        Ok(response.map(|body| ContactDetails {
            first_name: body.properties.firstname,
            last_name: body.properties.lastname,
            email: body.properties.email,
        }))
    }

    async fn associated_company_id(&self, contact_id: &str) -> Result<Option<CompanyId>> {
        let token = self.access_token().await?;
        let path = format!("/crm/v3/objects/contacts/{contact_id}/associations/companies");
        let response: Option<AssociationsResponse> =
            self.get_json(&token, &path, "company association").await;

        Ok(response.and_then(|body| body.results.into_iter().next().map(|result| result.id)))
    }

    async fn post_contact_event(&self, event: &ContactEvent) -> Result<Option<ContactId>> {
        let token = self.access_token().await?;

        let mut tokens = BTreeMap::new();
        tokens.insert("messageText".to_string(), event.text.clone());
        tokens.insert("senderName".to_string(), event.sender.clone());
        tokens.insert("direction".to_string(), Self::direction_label(event.is_inbound).to_string());

        let request = TimelineEventRequest {
            event_template_id: self.templates.contact.clone(),
            object_id: event.contact_id.clone(),
            email: if event.contact_id.is_none() { event.email.clone() } else { None },
            tokens,
        };

        let response: Option<TimelineEventResponse> =
            self.post_json(&token, "/crm/v3/timeline/events", &request, "contact event").await;

        match response {
            Some(body) => Ok(body.object_id.or_else(|| event.contact_id.clone())),
            None => Ok(None),
        }
    }

    async fn post_company_event(&self, event: &CompanyEvent) -> Result<bool> {
        let token = self.access_token().await?;
        let identity = self.cached_identity().await;

        let mut tokens = BTreeMap::new();
        tokens.insert("contactName".to_string(), event.contact_name.clone());
        tokens.insert("messagePreview".to_string(), snippet(&event.text, COMPANY_SNIPPET_MAX_CHARS));
        tokens.insert("senderName".to_string(), event.sender.clone());
        tokens.insert("direction".to_string(), Self::direction_label(event.is_inbound).to_string());
        if let Some(portal_id) = identity.portal_id {
            tokens.insert("portalId".to_string(), portal_id.to_string());
        }

        let request = TimelineEventRequest {
            event_template_id: self.templates.company.clone(),
            object_id: Some(event.company_id.clone()),
            email: None,
            tokens,
        };

        let response: Option<TimelineEventResponse> =
            self.post_json(&token, "/crm/v3/timeline/events", &request, "company event").await;

        Ok(response.is_some())
    }
}
