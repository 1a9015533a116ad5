//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// OAuth redirect capture
pub const CALLBACK_PORT: u16 = 8743;
pub const CALLBACK_PATH: &str = "/oauth/callback";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8743/oauth/callback";

// Token lifecycle
pub const TOKEN_FILE_NAME: &str = "crm_tokens.json";
pub const APP_DATA_DIR: &str = "chatsync";
pub const REFRESH_THRESHOLD_SECONDS: i64 = 300;

// Provider endpoints (HubSpot-shaped CRM surface)
pub const DEFAULT_AUTHORIZATION_ENDPOINT: &str = "https://app.hubspot.com/oauth/authorize";
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://api.hubapi.com/oauth/v1/token";
pub const DEFAULT_API_BASE_URL: &str = "https://api.hubapi.com";
pub const DEFAULT_OAUTH_SCOPES: &[&str] = &[
    "crm.objects.contacts.read",
    "crm.objects.contacts.write",
    "crm.objects.companies.read",
    "timeline",
];

// Credential resolution (environment first, settings store second)
pub const ENV_CLIENT_ID: &str = "CHATSYNC_CRM_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "CHATSYNC_CRM_CLIENT_SECRET";
pub const SETTINGS_KEY_CLIENT_ID: &str = "crm.client_id";
pub const SETTINGS_KEY_CLIENT_SECRET: &str = "crm.client_secret";

// Timeline event templates (environment only)
pub const ENV_CONTACT_EVENT_TEMPLATE_ID: &str = "CHATSYNC_CONTACT_EVENT_TEMPLATE_ID";
pub const ENV_COMPANY_EVENT_TEMPLATE_ID: &str = "CHATSYNC_COMPANY_EVENT_TEMPLATE_ID";
pub const DEFAULT_CONTACT_EVENT_TEMPLATE_ID: &str = "1058337";
pub const DEFAULT_COMPANY_EVENT_TEMPLATE_ID: &str = "1058338";

// UI notification events
pub const EVENT_AUTH_SUCCEEDED: &str = "crm-auth-succeeded";
pub const EVENT_DISCONNECTED: &str = "crm-disconnected";

// CRM sync
pub const COMPANY_SNIPPET_MAX_CHARS: usize = 200;
pub const FALLBACK_AGENT_NAME: &str = "Agent";
pub const UNKNOWN_CONTACT_NAME: &str = "Unknown";
