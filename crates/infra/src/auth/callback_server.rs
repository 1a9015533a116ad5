//! Loopback redirect capture
//!
//! A short-lived HTTP listener on the loopback interface that receives the
//! provider's redirect, performs the code exchange, persists the resulting
//! tokens, and announces the outcome. The listener is single-use: the first
//! request carrying a `code` parameter resolves the flow and the server
//! shuts itself down, whatever the exchange outcome. Requests without a
//! code (health probes, favicon fetches) get a 404 and the listener stays
//! up.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use chatsync_core::{ConsentBrowser, EventSink};
use chatsync_domain::constants::{CALLBACK_PATH, EVENT_AUTH_SUCCEEDED};
use chatsync_domain::{ChatSyncError, Result};
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::oauth_client::OAuthClient;
use super::token_store::TokenStore;

struct CallbackState {
    oauth: Arc<OAuthClient>,
    tokens: Arc<TokenStore>,
    events: Arc<dyn EventSink>,
    browser: Arc<dyn ConsentBrowser>,
    done: Notify,
}

/// Running loopback listener for one consent flow.
pub struct CallbackServer {
    port: u16,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl CallbackServer {
    /// Bind the listener and start serving. Pass port 0 to let the OS pick
    /// a free port (the bound port is available via [`CallbackServer::port`]).
    pub async fn start(
        port: u16,
        oauth: Arc<OAuthClient>,
        tokens: Arc<TokenStore>,
        events: Arc<dyn EventSink>,
        browser: Arc<dyn ConsentBrowser>,
        idle_timeout: Option<Duration>,
    ) -> Result<Self> {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|err| {
            ChatSyncError::Platform(format!("failed to bind callback listener on {addr}: {err}"))
        })?;
        let bound_port = listener
            .local_addr()
            .map_err(|err| ChatSyncError::Platform(format!("failed to read bound address: {err}")))?
            .port();

        let state = Arc::new(CallbackState { oauth, tokens, events, browser, done: Notify::new() });

        let router = Router::new()
            .route(CALLBACK_PATH, get(handle_callback))
            .fallback(|| async { (StatusCode::NOT_FOUND, "Not found") })
            .with_state(Arc::clone(&state));

        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let shutdown_state = Arc::clone(&state);
            let serve = axum::serve(listener, router).with_graceful_shutdown(async move {
                let idle = async {
                    match idle_timeout {
                        Some(timeout) => tokio::time::sleep(timeout).await,
                        None => std::future::pending().await,
                    }
                };
                tokio::select! {
                    _ = rx => info!("callback listener stopped on request"),
                    _ = shutdown_state.done.notified() => info!("callback listener finished its flow"),
                    _ = idle => warn!("callback listener idle timeout elapsed"),
                }
            });
            if let Err(err) = serve.await {
                error!(error = %err, "callback listener terminated abnormally");
            }
        });

        info!(port = bound_port, "callback listener started");

        Ok(Self { port: bound_port, shutdown: Some(tx), handle })
    }

    /// Port the listener is bound to.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Redirect URI this listener serves.
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}{}", self.port, CALLBACK_PATH)
    }

    /// Whether the listener task has already exited (flow handled, stopped,
    /// or timed out).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop the listener without waiting for a callback.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for CallbackServer {
    fn drop(&mut self) {
        self.shutdown();
        self.handle.abort();
    }
}

async fn handle_callback(
    State(state): State<Arc<CallbackState>>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, &'static str) {
    let Some(code) = params.get("code").filter(|code| !code.is_empty()) else {
        // Not the provider redirect; keep waiting for the real one.
        return (StatusCode::NOT_FOUND, "Not found");
    };

    let response = process_code(&state, code).await;
    state.done.notify_waiters();
    response
}

async fn process_code(state: &CallbackState, code: &str) -> (StatusCode, &'static str) {
    if !state.oauth.config().is_configured() {
        error!("received authorization code but OAuth credentials are not configured");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "CRM connection is not configured. Close this window and check the application settings.",
        );
    }

    let tokens = match state.oauth.exchange_code(code).await {
        Ok(tokens) => tokens,
        Err(err) => {
            error!(error = %err, "authorization code exchange failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication failed. Close this window and try connecting again.",
            );
        }
    };

    if let Err(err) = state.tokens.save(tokens).await {
        error!(error = %err, "failed to persist tokens after exchange");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Authentication failed. Close this window and try connecting again.",
        );
    }

    info!("authorization flow completed");
    state.events.publish(EVENT_AUTH_SUCCEEDED, Some(true));
    state.browser.close();

    (StatusCode::OK, "Authentication successful! You can close this window.")
}
