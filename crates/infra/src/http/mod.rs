//! HTTP client wrapper shared by the OAuth and CRM integrations.

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};
