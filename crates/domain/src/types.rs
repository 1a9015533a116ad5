//! Common data types used throughout the application

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::FALLBACK_AGENT_NAME;

/// OAuth 2.0 access and refresh tokens with metadata
///
/// The persisted token record is always fully populated or fully absent;
/// partial records are never written. `issued_at` is stored explicitly inside
/// the record so expiry does not depend on filesystem timestamps (mtime is
/// reset by copies and is subject to clock skew).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Access token for API authentication
    pub access_token: String,

    /// Refresh token for obtaining new access tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Access token lifetime in seconds; absence means non-expiring
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,

    /// When the token pair was issued (UTC)
    pub issued_at: DateTime<Utc>,
}

impl TokenSet {
    /// Create a new `TokenSet` issued now.
    #[must_use]
    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
        expires_in: Option<i64>,
    ) -> Self {
        Self { access_token, refresh_token, expires_in, issued_at: Utc::now() }
    }

    /// Seconds elapsed since the token pair was issued.
    #[must_use]
    pub fn age_seconds(&self) -> i64 {
        (Utc::now() - self.issued_at).num_seconds()
    }

    /// Seconds of lifetime remaining, or `None` when no expiry is set.
    #[must_use]
    pub fn seconds_until_expiry(&self) -> Option<i64> {
        self.expires_in.map(|lifetime| lifetime - self.age_seconds())
    }

    /// Whether the access token has outlived `expires_in`.
    ///
    /// Pinned to strictly-greater: a token whose age equals its lifetime is
    /// still considered live. No expiry metadata means non-expiring.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        match self.expires_in {
            Some(lifetime) => self.age_seconds() > lifetime,
            None => false,
        }
    }

    /// Whether the record can authenticate a call right now.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.access_token.is_empty() && !self.is_expired()
    }

    /// Whether a proactive refresh is due.
    ///
    /// True only when a refresh token exists and the remaining lifetime is
    /// below `threshold_seconds`. Without expiry metadata there is nothing to
    /// refresh against.
    #[must_use]
    pub fn needs_refresh(&self, threshold_seconds: i64) -> bool {
        if self.refresh_token.is_none() {
            return false;
        }
        match self.seconds_until_expiry() {
            Some(remaining) => remaining < threshold_seconds,
            None => false,
        }
    }
}

/// Normalized message handed to the sync pipeline by the host application.
///
/// `address` is either an E.164-like phone string or an email address;
/// classification happens inside the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMessage {
    pub address: String,
    pub text: String,
    pub is_inbound: bool,
    pub sender: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// Display identity of the authenticated CRM user.
///
/// Derived from the current token, so any token change invalidates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl AuthenticatedUser {
    /// Generic placeholder identity used when introspection fails entirely.
    #[must_use]
    pub fn fallback() -> Self {
        Self { display_name: FALLBACK_AGENT_NAME.to_string(), email: None }
    }
}
