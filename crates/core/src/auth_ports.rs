//! Auth and host-facing port interfaces
//!
//! The UI shell, the notification channel toward it, and the generic
//! key/value config store are external collaborators; the core only
//! depends on these traits.

use chatsync_domain::Result;

/// Fire-and-forget notification channel toward the host UI.
///
/// Implementations must not block and must not fail loudly; a dropped
/// notification is acceptable, a stalled pipeline is not.
pub trait EventSink: Send + Sync {
    /// Publish a named event with an optional boolean payload.
    fn publish(&self, event: &str, payload: Option<bool>);
}

/// Browser surface used to collect OAuth consent.
///
/// Desktop hosts open the system browser or an embedded webview; tests use a
/// recording stub.
pub trait ConsentBrowser: Send + Sync {
    /// Open the authorization URL. Errors are surfaced to `start()`.
    fn open(&self, url: &str) -> Result<()>;

    /// Close any open consent window. Best-effort; never fails.
    fn close(&self);
}

/// Read-only view of the host's persisted key/value configuration.
///
/// Consulted only for the two optional credential values when the
/// environment does not supply them.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}
