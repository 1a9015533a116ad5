//! Credential and template resolution
//!
//! ## Loading Strategy
//! Client id and secret are resolved with a fixed precedence:
//! 1. Environment variables (`CHATSYNC_CRM_CLIENT_ID`,
//!    `CHATSYNC_CRM_CLIENT_SECRET`)
//! 2. The host's persisted key/value settings store (`crm.client_id`,
//!    `crm.client_secret`)
//!
//! Timeline event template identifiers are environment-only
//! (`CHATSYNC_CONTACT_EVENT_TEMPLATE_ID`,
//! `CHATSYNC_COMPANY_EVENT_TEMPLATE_ID`) with built-in defaults.
//!
//! Missing credentials are not an error here; the lifecycle manager and the
//! callback route surface the configuration failure at the point of use.

use chatsync_core::SettingsStore;
use chatsync_domain::constants::{
    DEFAULT_COMPANY_EVENT_TEMPLATE_ID, DEFAULT_CONTACT_EVENT_TEMPLATE_ID,
    ENV_CLIENT_ID, ENV_CLIENT_SECRET, ENV_COMPANY_EVENT_TEMPLATE_ID,
    ENV_CONTACT_EVENT_TEMPLATE_ID, SETTINGS_KEY_CLIENT_ID, SETTINGS_KEY_CLIENT_SECRET,
};

/// OAuth application credentials. Either value may be empty when neither the
/// environment nor the settings store supplies it.
#[derive(Debug, Clone, Default)]
pub struct CrmCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl CrmCredentials {
    /// Whether both values required for a token exchange are present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

/// Timeline event template identifiers used by the CRM client.
#[derive(Debug, Clone)]
pub struct EventTemplates {
    pub contact: String,
    pub company: String,
}

/// Resolve OAuth credentials: environment first, settings store second.
pub fn load_credentials(settings: &dyn SettingsStore) -> CrmCredentials {
    let client_id = env_or_settings(ENV_CLIENT_ID, settings, SETTINGS_KEY_CLIENT_ID);
    let client_secret = env_or_settings(ENV_CLIENT_SECRET, settings, SETTINGS_KEY_CLIENT_SECRET);

    if client_id.is_empty() {
        tracing::debug!("no CRM client id found in environment or settings");
    }

    CrmCredentials { client_id, client_secret }
}

/// Resolve timeline event template ids from the environment, with defaults.
pub fn load_event_templates() -> EventTemplates {
    EventTemplates {
        contact: non_empty_env(ENV_CONTACT_EVENT_TEMPLATE_ID)
            .unwrap_or_else(|| DEFAULT_CONTACT_EVENT_TEMPLATE_ID.to_string()),
        company: non_empty_env(ENV_COMPANY_EVENT_TEMPLATE_ID)
            .unwrap_or_else(|| DEFAULT_COMPANY_EVENT_TEMPLATE_ID.to_string()),
    }
}

fn env_or_settings(env_key: &str, settings: &dyn SettingsStore, settings_key: &str) -> String {
    non_empty_env(env_key)
        .or_else(|| settings.get(settings_key).filter(|value| !value.is_empty()))
        .unwrap_or_default()
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}
