//! # ChatSync Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - File-backed token store and OAuth lifecycle management
//! - The local redirect-capture server for the authorization flow
//! - The CRM REST client
//! - Configuration loading (environment + settings file)
//!
//! ## Architecture
//! - Implements traits defined in `chatsync-core`
//! - Contains all "impure" code (HTTP, filesystem)

pub mod auth;
pub mod config;
pub mod crm;
pub mod errors;
pub mod http;

// Re-export commonly used items
pub use auth::{CallbackServer, OAuthClient, OAuthConfig, OAuthManager, TokenStore};
pub use config::{load_credentials, load_event_templates, CrmCredentials, EventTemplates, JsonSettingsStore};
pub use crm::CrmClient;
pub use errors::InfraError;
pub use http::HttpClient;
