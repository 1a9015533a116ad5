//! # ChatSync Domain
//!
//! Business domain types and models for the ChatSync CRM bridge.
//!
//! This crate contains:
//! - Domain data types (TokenSet, SyncMessage, AuthenticatedUser, ...)
//! - Domain error types and Result definitions
//! - Domain constants (ports, paths, event names, env vars)
//!
//! ## Architecture
//! - No dependencies on other ChatSync crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use errors::*;
pub use types::*;
