//! Tracing setup and command logging helpers.

use std::time::Duration;

use chatsync_domain::ChatSyncError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Initialize the process-wide tracing subscriber.
///
/// `RUST_LOG` overrides the default filter. Safe to call once at startup;
/// a second call is a no-op because the global subscriber is already set.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,chatsync=debug"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).try_init();
}

/// Log the outcome of a command execution with structured fields.
///
/// `command` is the logical command identifier (e.g. `"auth::start_crm_auth"`)
/// and must not carry sensitive values.
#[inline]
pub fn log_command_execution(command: &str, elapsed: Duration, success: bool) {
    let duration_ms = elapsed.as_millis() as u64;

    if success {
        info!(command, duration_ms, "command_execution_success");
    } else {
        warn!(command, duration_ms, "command_execution_failure");
    }
}

/// Convert a `ChatSyncError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &ChatSyncError) -> &'static str {
    match error {
        ChatSyncError::Config(_) => "config",
        ChatSyncError::Auth(_) => "auth",
        ChatSyncError::Network(_) => "network",
        ChatSyncError::Platform(_) => "platform",
        ChatSyncError::NotFound(_) => "not_found",
        ChatSyncError::InvalidInput(_) => "invalid_input",
        ChatSyncError::Internal(_) => "internal",
    }
}
