//! # ChatSync Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits)
//! - The CRM sync pipeline use case
//!
//! ## Architecture Principles
//! - Only depends on `chatsync-domain`
//! - No HTTP, filesystem, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod sync;

// Infrastructure ports
pub mod auth_ports;
pub mod crm_ports;

// Re-export specific items to avoid ambiguity
pub use auth_ports::{ConsentBrowser, EventSink, SettingsStore};
pub use crm_ports::{
    CompanyEvent, CompanyId, ContactDetails, ContactEvent, ContactId, CrmApi,
};
pub use sync::ports::TokenGate;
pub use sync::{SyncOutcome, SyncService};
