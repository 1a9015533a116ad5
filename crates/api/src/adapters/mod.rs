//! Host adapters for the core ports.

use chatsync_core::{ConsentBrowser, EventSink};
use chatsync_domain::{ChatSyncError, Result};
use tracing::{debug, info};

/// Opens the consent URL in the user's default browser.
///
/// The system browser cannot be closed programmatically, so `close()` is a
/// logged no-op; the success page asks the user to close the tab.
#[derive(Debug, Default)]
pub struct SystemBrowser;

impl ConsentBrowser for SystemBrowser {
    fn open(&self, url: &str) -> Result<()> {
        open::that(url)
            .map_err(|err| ChatSyncError::Platform(format!("failed to open browser: {err}")))
    }

    fn close(&self) {
        debug!("system browser window left for the user to close");
    }
}

/// Event sink that only logs. Stands in for the host UI channel when the
/// bridge runs headless or under test.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn publish(&self, event: &str, payload: Option<bool>) {
        info!(event, ?payload, "bridge event");
    }
}
