// SPDX-License-Identifier: MIT

//! Local cache snapshot.
//!
//! One JSON file holding the last-known sessions, settings and OAuth
//! tokens. Reads are synchronous so startup can paint from cache before
//! the remote fetch resolves; a corrupt or missing file degrades to an
//! empty snapshot, never an error.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::models::{Session, Settings};
use crate::services::tokens::TokenSet;

/// On-disk snapshot layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheSnapshot {
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
    /// OAuth token sets keyed by provider name.
    #[serde(default)]
    pub tokens: HashMap<String, TokenSet>,
}

/// Durable local storage backed by a single JSON file.
#[derive(Clone)]
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot. Missing or unparsable files yield the default.
    pub fn load(&self) -> CacheSnapshot {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return CacheSnapshot::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Discarding corrupt cache file");
                CacheSnapshot::default()
            }
        }
    }

    /// Replace the cached session list, keeping the rest of the snapshot.
    pub fn store_sessions(&self, sessions: &[Session]) {
        let mut snapshot = self.load();
        snapshot.sessions = sessions.to_vec();
        self.save(&snapshot);
    }

    /// Replace the cached settings record.
    pub fn store_settings(&self, settings: &Settings) {
        let mut snapshot = self.load();
        snapshot.settings = Some(settings.clone());
        self.save(&snapshot);
    }

    /// Store or clear the token set for a provider.
    pub fn store_tokens(&self, provider: &str, tokens: Option<&TokenSet>) {
        let mut snapshot = self.load();
        match tokens {
            Some(t) => {
                snapshot.tokens.insert(provider.to_string(), t.clone());
            }
            None => {
                snapshot.tokens.remove(provider);
            }
        }
        self.save(&snapshot);
    }

    /// Token set previously stored for a provider, if any.
    pub fn load_tokens(&self, provider: &str) -> Option<TokenSet> {
        self.load().tokens.get(provider).cloned()
    }

    /// Remove the snapshot file entirely.
    pub fn clear(&self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove cache file");
            }
        }
    }

    /// Write the snapshot via a temp file so readers never see a torn write.
    fn save(&self, snapshot: &CacheSnapshot) {
        let payload = match serde_json::to_vec_pretty(snapshot) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize cache snapshot");
                return;
            }
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                let _ = fs::create_dir_all(parent);
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        let result = fs::write(&tmp, &payload).and_then(|()| fs::rename(&tmp, &self.path));
        if let Err(e) = result {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to write cache file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SessionTemplate, Sport};
    use chrono::NaiveDate;

    fn temp_cache() -> FileCache {
        let path = std::env::temp_dir().join(format!(
            "trainboard_cache_test_{}.json",
            uuid::Uuid::new_v4().simple()
        ));
        FileCache::new(path)
    }

    fn sample_session() -> Session {
        SessionTemplate {
            date: None,
            sport: Sport::Running,
            session_type: "tempo".to_string(),
            title: "Tempo run".to_string(),
            description: String::new(),
            duration_min: 45,
            steps: vec![],
            distance_km: None,
            elevation_m: None,
        }
        .into_session(NaiveDate::from_ymd_opt(2025, 3, 11).unwrap())
    }

    #[test]
    fn test_missing_file_loads_default() {
        let cache = temp_cache();
        let snapshot = cache.load();
        assert!(snapshot.sessions.is_empty());
        assert!(snapshot.settings.is_none());
    }

    #[test]
    fn test_sessions_round_trip() {
        let cache = temp_cache();
        let session = sample_session();
        cache.store_sessions(std::slice::from_ref(&session));

        let snapshot = cache.load();
        assert_eq!(snapshot.sessions.len(), 1);
        assert_eq!(snapshot.sessions[0].id, session.id);
        cache.clear();
    }

    #[test]
    fn test_corrupt_file_degrades_to_default() {
        let cache = temp_cache();
        fs::write(cache.path(), b"{ not json").unwrap();
        let snapshot = cache.load();
        assert!(snapshot.sessions.is_empty());
        cache.clear();
    }

    #[test]
    fn test_tokens_store_and_clear() {
        let cache = temp_cache();
        let tokens = TokenSet {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            expires_at: 1_900_000_000,
        };

        cache.store_tokens("strava", Some(&tokens));
        assert_eq!(cache.load_tokens("strava").unwrap().access_token, "a");
        // Storing sessions must not disturb tokens
        cache.store_sessions(&[sample_session()]);
        assert!(cache.load_tokens("strava").is_some());

        cache.store_tokens("strava", None);
        assert!(cache.load_tokens("strava").is_none());
        cache.clear();
    }
}
