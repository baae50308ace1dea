//! Flat JSON key-value store.
//!
//! One file holds a JSON object. `sessions` maps to the session list and
//! `settings` to the settings record. Anything unreadable degrades to the
//! empty/default value with a warning; only writes report errors.

use std::path::Path;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::error::StoreError;
use crate::session::Session;
use crate::settings::Settings;

pub const SESSIONS_KEY: &str = "sessions";
pub const SETTINGS_KEY: &str = "settings";
pub const STORE_FILE_NAME: &str = "data.json";

#[derive(Debug, Clone)]
pub struct FlatStore {
    path: PathBuf,
}

impl FlatStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| StoreError::io(parent, err))?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_sessions(&self) -> Vec<Session> {
        self.load_key(SESSIONS_KEY)
    }

    pub fn load_settings(&self) -> Settings {
        self.load_key(SETTINGS_KEY)
    }

    pub fn save_sessions(&self, sessions: &[Session]) -> Result<(), StoreError> {
        self.write_key(SESSIONS_KEY, serde_json::to_value(sessions)?)
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        self.write_key(SETTINGS_KEY, serde_json::to_value(settings)?)
    }

    fn load_key<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let Some(value) = self.read_document().remove(key) else {
            return T::default();
        };
        match serde_json::from_value(value) {
            Ok(decoded) => decoded,
            Err(err) => {
                tracing::warn!(key, error = %err, "malformed store entry, using default");
                T::default()
            }
        }
    }

    fn read_document(&self) -> Map<String, Value> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Map::new(),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "store unreadable");
                return Map::new();
            }
        };
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                tracing::warn!(path = %self.path.display(), "store root is not an object");
                Map::new()
            }
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "store is not valid json");
                Map::new()
            }
        }
    }

    fn write_key(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut document = self.read_document();
        document.insert(key.to_string(), value);
        let encoded = serde_json::to_vec_pretty(&Value::Object(document))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, encoded).map_err(|err| StoreError::io(&tmp, err))?;
        std::fs::rename(&tmp, &self.path).map_err(|err| StoreError::io(&self.path, err))?;
        tracing::debug!(key, path = %self.path.display(), "store written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;
    use crate::settings::Theme;
    use chrono::TimeZone;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let store = FlatStore::open(dir.path().join("nested/data.json")).unwrap();
        assert!(store.load_sessions().is_empty());
        assert_eq!(store.load_settings(), Settings::default());
    }

    #[test]
    fn keys_are_written_independently() {
        let dir = tempdir().unwrap();
        let store = FlatStore::open(dir.path().join(STORE_FILE_NAME)).unwrap();

        let mut sessions = SessionStore::new();
        sessions.start_new(Utc.timestamp_opt(1_700_000_000, 0).single().unwrap());
        store.save_sessions(sessions.sessions()).unwrap();

        let settings = Settings {
            theme: Theme::Light,
            allow_command_execution: true,
            ..Settings::default()
        };
        store.save_settings(&settings).unwrap();

        assert_eq!(store.load_sessions(), sessions.sessions());
        assert_eq!(store.load_settings(), settings);
    }

    #[test]
    fn corrupt_file_falls_back_and_is_overwritten_on_save() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(STORE_FILE_NAME);
        std::fs::write(&path, b"{not json").unwrap();
        let store = FlatStore::open(&path).unwrap();

        assert!(store.load_sessions().is_empty());
        assert_eq!(store.load_settings(), Settings::default());

        store.save_settings(&Settings::default()).unwrap();
        let raw: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert!(raw.get(SETTINGS_KEY).is_some());
    }

    #[test]
    fn malformed_key_does_not_poison_other_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(STORE_FILE_NAME);
        std::fs::write(
            &path,
            br#"{"sessions": "oops", "settings": {"allowCommandExecution": true}}"#,
        )
        .unwrap();
        let store = FlatStore::open(&path).unwrap();
        assert!(store.load_sessions().is_empty());
        assert!(store.load_settings().allow_command_execution);
    }
}
