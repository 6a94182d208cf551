//! Durable client-side key-value storage for user preferences.
//!
//! The browser keeps voice preferences in local storage; here that storage
//! is a port so the speech layer never touches global state directly.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::{InlustroError, Result};
use crate::types::{VoiceGender, VoiceSettings};

/// Storage key for the preferred voice gender.
pub const VOICE_GENDER_KEY: &str = "voiceGender";
/// Storage key for the mute preference.
pub const VOICE_MUTED_KEY: &str = "voiceMuted";

/// String key-value storage that survives across sessions.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Volatile store, used in tests and when no data directory is available.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|e| InlustroError::Preferences(format!("store lock poisoned: {}", e)))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| InlustroError::Preferences(format!("store lock poisoned: {}", e)))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON-file backed store. Every `set` rewrites the whole file.
#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| InlustroError::Preferences(format!("store lock poisoned: {}", e)))?;
        Ok(self.read_all()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| InlustroError::Preferences(format!("store lock poisoned: {}", e)))?;
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&values)?)?;
        debug!(key, path = %self.path.display(), "Preference saved");
        Ok(())
    }
}

impl VoiceSettings {
    /// Restore persisted voice preferences. Unreadable or unknown values
    /// fall back to defaults.
    pub fn load(store: &dyn PreferenceStore) -> Self {
        let mut settings = VoiceSettings::default();

        match store.get(VOICE_GENDER_KEY) {
            Ok(Some(raw)) => match raw.parse::<VoiceGender>() {
                Ok(gender) => settings.gender = gender,
                Err(e) => warn!(error = %e, "Ignoring stored voice gender"),
            },
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to read voice gender preference"),
        }

        match store.get(VOICE_MUTED_KEY) {
            Ok(Some(raw)) => settings.muted = raw == "true",
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to read mute preference"),
        }

        settings
    }

    /// Persist the durable part of the settings (gender and mute).
    pub fn persist(&self, store: &dyn PreferenceStore) -> Result<()> {
        store.set(VOICE_GENDER_KEY, self.gender.as_str())?;
        store.set(VOICE_MUTED_KEY, if self.muted { "true" } else { "false" })?;
        Ok(())
    }
}
