//! File-backed token store
//!
//! Owns the persisted token artifact and its in-memory mirror:
//! - Load on startup (a malformed artifact is logged and treated as absent)
//! - Whole-file replace on save, whole-file delete on clear
//! - Expiry and refresh-threshold queries for the lifecycle manager
//!
//! The record is either fully present or fully absent; partial records are
//! never written. Absence of the artifact means "not connected".

use std::path::{Path, PathBuf};

use chatsync_domain::constants::{APP_DATA_DIR, TOKEN_FILE_NAME};
use chatsync_domain::{ChatSyncError, Result, TokenSet};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::errors::InfraError;

/// In-memory token record plus its on-disk JSON mirror.
pub struct TokenStore {
    path: PathBuf,
    current: RwLock<Option<TokenSet>>,
}

impl TokenStore {
    /// Create a store backed by `path`. Does not touch the filesystem; call
    /// [`TokenStore::load`] on startup to hydrate the in-memory record.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path, current: RwLock::new(None) }
    }

    /// Well-known artifact location inside the per-user data directory.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DATA_DIR)
            .join(TOKEN_FILE_NAME)
    }

    /// Path of the persisted artifact.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Hydrate the in-memory record from disk.
    ///
    /// A missing artifact means no prior auth; a malformed one is logged and
    /// treated the same way, never surfaced as an error.
    pub async fn load(&self) -> bool {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("no persisted token record found");
                return false;
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to read token record");
                return false;
            }
        };

        match serde_json::from_str::<TokenSet>(&contents) {
            Ok(tokens) => {
                *self.current.write().await = Some(tokens);
                info!("token store initialized with existing record");
                true
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "token record is malformed; treating as absent");
                false
            }
        }
    }

    /// Persist a new record, replacing any previous one.
    ///
    /// The in-memory record is swapped only after the write succeeds, so
    /// readers never observe a record the disk does not hold.
    pub async fn save(&self, tokens: TokenSet) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| {
                let infra: InfraError = err.into();
                ChatSyncError::from(infra)
            })?;
        }

        let json = serde_json::to_string_pretty(&tokens).map_err(|err| {
            let infra: InfraError = err.into();
            ChatSyncError::from(infra)
        })?;

        std::fs::write(&self.path, json).map_err(|err| {
            let infra: InfraError = err.into();
            ChatSyncError::from(infra)
        })?;

        *self.current.write().await = Some(tokens);
        info!("token record saved");

        Ok(())
    }

    /// Delete the artifact and clear the in-memory record. Idempotent:
    /// absence of the artifact is not an error.
    pub async fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                let infra: InfraError = err.into();
                return Err(ChatSyncError::from(infra));
            }
        }

        *self.current.write().await = None;
        info!("token record cleared");

        Ok(())
    }

    /// Current record, if any.
    pub async fn read(&self) -> Option<TokenSet> {
        self.current.read().await.clone()
    }

    /// Whether a usable (present and unexpired) access token exists.
    pub async fn is_valid(&self) -> bool {
        self.current.read().await.as_ref().is_some_and(TokenSet::is_valid)
    }

    /// Whether a proactive refresh is due (see [`TokenSet::needs_refresh`]).
    pub async fn needs_refresh(&self, threshold_seconds: i64) -> bool {
        self.current
            .read()
            .await
            .as_ref()
            .is_some_and(|tokens| tokens.needs_refresh(threshold_seconds))
    }
}
