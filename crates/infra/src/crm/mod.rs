//! CRM provider integration: REST client and wire types.

pub mod client;
pub mod types;

pub use client::CrmClient;
