//! CRM connection commands
//!
//! Thin async handlers over the OAuth lifecycle manager. Errors cross the
//! host boundary as strings; structured detail stays in the logs.

use std::sync::Arc;
use std::time::Instant;

use chatsync_domain::TokenSet;
use tracing::error;

use crate::context::AppContext;
use crate::utils::logging::{error_label, log_command_execution};

/// Start the OAuth consent flow: bind the local redirect listener and open
/// the provider's authorization page in the browser.
pub async fn start_crm_auth(ctx: &Arc<AppContext>) -> Result<(), String> {
    let start = Instant::now();
    let result = ctx.oauth.start().await;

    log_command_execution("auth::start_crm_auth", start.elapsed(), result.is_ok());

    result.map_err(|err| {
        error!(error = %err, kind = error_label(&err), "failed to start CRM authorization");
        err.to_string()
    })
}

/// Current persisted token record, if any. Never fails; an absent record is
/// a normal "not connected" answer.
pub async fn get_stored_tokens(ctx: &Arc<AppContext>) -> Result<Option<TokenSet>, String> {
    let start = Instant::now();
    let tokens = ctx.oauth.get_tokens().await;

    log_command_execution("auth::get_stored_tokens", start.elapsed(), true);

    Ok(tokens)
}

/// Disconnect from the CRM: delete the token record and notify the host.
pub async fn disconnect_crm(ctx: &Arc<AppContext>) -> Result<(), String> {
    let start = Instant::now();
    let result = ctx.oauth.disconnect().await;

    log_command_execution("auth::disconnect_crm", start.elapsed(), result.is_ok());

    result.map_err(|err| {
        error!(error = %err, kind = error_label(&err), "failed to disconnect from CRM");
        err.to_string()
    })
}
