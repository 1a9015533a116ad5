//! Minimal file-backed view of the host's key/value settings.
//!
//! The desktop host owns the real settings store; this bridge only reads the
//! two optional credential values from its JSON artifact. A missing or
//! malformed file is treated as an empty store, never an error.

use std::collections::HashMap;
use std::path::Path;

use chatsync_core::SettingsStore;
use tracing::debug;

/// Read-only snapshot of a flat JSON object of string values.
#[derive(Debug, Clone, Default)]
pub struct JsonSettingsStore {
    values: HashMap<String, String>,
}

impl JsonSettingsStore {
    /// Load a settings snapshot from `path`.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "settings file not readable; using empty store");
                return Self::default();
            }
        };

        match serde_json::from_str::<HashMap<String, serde_json::Value>>(&contents) {
            Ok(raw) => {
                let values = raw
                    .into_iter()
                    .filter_map(|(key, value)| match value {
                        serde_json::Value::String(s) => Some((key, s)),
                        _ => None,
                    })
                    .collect();
                Self { values }
            }
            Err(err) => {
                debug!(path = %path.display(), error = %err, "settings file is not valid JSON; using empty store");
                Self::default()
            }
        }
    }
}

impl SettingsStore for JsonSettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn reads_string_values_and_skips_others() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"crm.client_id":"abc","other":42}}"#).unwrap();

        let store = JsonSettingsStore::load(file.path());
        assert_eq!(store.get("crm.client_id"), Some("abc".to_string()));
        assert_eq!(store.get("other"), None);
    }

    #[test]
    fn missing_file_is_an_empty_store() {
        let store = JsonSettingsStore::load(Path::new("/nonexistent/settings.json"));
        assert_eq!(store.get("crm.client_id"), None);
    }

    #[test]
    fn malformed_file_is_an_empty_store() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();

        let store = JsonSettingsStore::load(file.path());
        assert_eq!(store.get("anything"), None);
    }
}
