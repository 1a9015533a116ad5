//! OAuth token lifecycle: persistence, code exchange, redirect capture, and
//! the manager orchestrating them.

pub mod callback_server;
pub mod manager;
pub mod oauth_client;
pub mod token_store;

pub use callback_server::CallbackServer;
pub use manager::OAuthManager;
pub use oauth_client::{OAuthClient, OAuthConfig};
pub use token_store::TokenStore;
