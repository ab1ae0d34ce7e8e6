// Persisted session state - bearer token and integration status flags
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct SessionData {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    connected: BTreeMap<String, bool>,
    #[serde(default)]
    synced: BTreeMap<String, String>,
}

/// Small write-through store for the bits of client state that survive a
/// restart: the gateway bearer token and per-provider connection status.
pub struct SessionStore {
    path: PathBuf,
    data: Mutex<SessionData>,
}

impl SessionStore {
    /// Load the session file, falling back to an empty session when the
    /// file is missing or unreadable.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(raw) => match toml::from_str(&raw) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!("session file {} is corrupt, starting fresh: {e}", path.display());
                    SessionData::default()
                }
            },
            Err(_) => SessionData::default(),
        };
        Self {
            path,
            data: Mutex::new(data),
        }
    }

    /// Store backed by a throwaway file under the system temp directory.
    pub fn ephemeral(name: &str) -> Self {
        let path = std::env::temp_dir()
            .join("commerce-insights-tests")
            .join(format!("{name}-{}.toml", std::process::id()));
        let _ = std::fs::remove_file(&path);
        Self::load(path)
    }

    pub fn token(&self) -> Option<String> {
        self.lock().token.clone()
    }

    pub fn set_token(&self, token: &str) -> anyhow::Result<()> {
        let mut data = self.lock();
        data.token = Some(token.to_string());
        self.persist(&data)
    }

    pub fn clear_token(&self) -> anyhow::Result<()> {
        let mut data = self.lock();
        data.token = None;
        self.persist(&data)
    }

    pub fn is_connected(&self, provider: &str) -> bool {
        self.lock().connected.get(provider).copied().unwrap_or(false)
    }

    pub fn set_connected(&self, provider: &str) -> anyhow::Result<()> {
        let mut data = self.lock();
        data.connected.insert(provider.to_string(), true);
        self.persist(&data)
    }

    pub fn synced_at(&self, provider: &str) -> Option<String> {
        self.lock().synced.get(provider).cloned()
    }

    pub fn set_synced(&self, provider: &str, timestamp: &str) -> anyhow::Result<()> {
        let mut data = self.lock();
        data.synced
            .insert(provider.to_string(), timestamp.to_string());
        self.persist(&data)
    }

    fn persist(&self, data: &SessionData) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, toml::to_string_pretty(data)?)?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionData> {
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_survive_reload() {
        let store = SessionStore::ephemeral("session_reload");
        store.set_token("bearer-xyz").unwrap();
        store.set_connected("shopify").unwrap();
        store.set_synced("shopify", "2026-08-06T09:00:00Z").unwrap();

        let reloaded = SessionStore::load(store.path.clone());
        assert_eq!(reloaded.token().as_deref(), Some("bearer-xyz"));
        assert!(reloaded.is_connected("shopify"));
        assert_eq!(
            reloaded.synced_at("shopify").as_deref(),
            Some("2026-08-06T09:00:00Z")
        );
        assert!(!reloaded.is_connected("stripe"));
    }

    #[test]
    fn test_missing_file_yields_empty_session() {
        let store = SessionStore::ephemeral("session_missing");
        assert_eq!(store.token(), None);
        assert!(!store.is_connected("shopify"));
    }

    #[test]
    fn test_corrupt_file_starts_fresh() {
        let store = SessionStore::ephemeral("session_corrupt");
        std::fs::create_dir_all(store.path.parent().unwrap()).unwrap();
        std::fs::write(&store.path, "not [valid toml").unwrap();

        let reloaded = SessionStore::load(store.path.clone());
        assert_eq!(reloaded.token(), None);
    }

    #[test]
    fn test_clear_token() {
        let store = SessionStore::ephemeral("session_clear");
        store.set_token("abc").unwrap();
        store.clear_token().unwrap();
        assert_eq!(store.token(), None);
    }
}
