//! CRM sync pipeline
//!
//! Resolves a message participant to a CRM contact and company and records
//! timeline events for both, best-effort and short-circuiting.

pub mod pipeline;
pub mod ports;

pub use pipeline::{SyncOutcome, SyncService};
pub use ports::TokenGate;
