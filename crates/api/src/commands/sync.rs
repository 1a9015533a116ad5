//! Message sync command

use std::sync::Arc;
use std::time::Instant;

use chatsync_domain::SyncMessage;

use crate::context::AppContext;
use crate::utils::logging::log_command_execution;

/// Sync one message to the CRM timeline.
///
/// Always succeeds from the host's point of view: CRM trouble must never
/// interfere with message delivery, so the pipeline logs and absorbs every
/// failure internally.
pub async fn sync_message(ctx: &Arc<AppContext>, message: SyncMessage) -> Result<(), String> {
    let start = Instant::now();
    ctx.sync.handle_new_message(&message).await;

    log_command_execution("sync::sync_message", start.elapsed(), true);

    Ok(())
}
