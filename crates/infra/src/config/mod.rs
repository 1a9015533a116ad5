//! Configuration loading for the CRM bridge.

pub mod loader;
pub mod settings;

pub use loader::{load_credentials, load_event_templates, CrmCredentials, EventTemplates};
pub use settings::JsonSettingsStore;
