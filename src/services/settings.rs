// SPDX-License-Identifier: MIT

//! Settings store: theme, wellness credentials, training phases and
//! objectives.
//!
//! Same local-first contract as the session store: memory is
//! authoritative, the cache mirrors synchronously, the remote record is
//! best-effort.

use tokio::sync::RwLock;

use crate::db::{FileCache, RemoteStore};
use crate::models::Settings;

pub struct SettingsStore {
    settings: RwLock<Settings>,
    cache: FileCache,
    remote: RemoteStore,
}

impl SettingsStore {
    pub fn new(cache: FileCache, remote: RemoteStore) -> Self {
        Self {
            settings: RwLock::new(Settings::default()),
            cache,
            remote,
        }
    }

    /// Hydrate from cache, then prefer the remote record when reachable.
    pub async fn initialize(&self) {
        if let Some(cached) = self.cache.load().settings {
            *self.settings.write().await = cached;
        }

        match self.remote.get_settings().await {
            Ok(Some(remote_settings)) => {
                self.cache.store_settings(&remote_settings);
                *self.settings.write().await = remote_settings;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Remote settings fetch failed, keeping cached settings");
            }
        }
    }

    pub async fn current(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Replace the settings record.
    pub async fn update(&self, settings: Settings) {
        self.cache.store_settings(&settings);
        *self.settings.write().await = settings.clone();

        let remote = self.remote.clone();
        tokio::spawn(async move {
            if let Err(e) = remote.set_settings(&settings).await {
                tracing::warn!(error = %e, "Remote settings write failed (local state kept)");
            }
        });
    }

    /// Add or replace a training phase by name.
    pub async fn upsert_phase(&self, phase: crate::models::TrainingPhase) {
        let mut updated = self.current().await;
        match updated.phases.iter_mut().find(|p| p.name == phase.name) {
            Some(slot) => *slot = phase,
            None => updated.phases.push(phase),
        }
        self.update(updated).await;
    }
}
