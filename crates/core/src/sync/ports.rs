//! Sync pipeline port interfaces

use async_trait::async_trait;

/// Gate consulted before any CRM call to keep the access token fresh.
///
/// Implemented by the OAuth lifecycle manager: returns `true` when no
/// refresh was needed or the refresh succeeded, `false` when a refresh was
/// needed but failed (the caller must not proceed).
#[async_trait]
pub trait TokenGate: Send + Sync {
    async fn ensure_fresh_token(&self) -> bool;
}
