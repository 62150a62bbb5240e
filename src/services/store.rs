// SPDX-License-Identifier: MIT

//! Authoritative in-process session store.
//!
//! The in-memory list is the single source of truth while the app runs.
//! Every mutation lands in memory first, is mirrored to the local cache
//! synchronously, and then propagated to the remote persistence service
//! best-effort in the background. A failed remote write never blocks or
//! reverts the local mutation; the repair mechanism is the next full
//! `initialize()` resync.

use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::{FileCache, RemoteStore};
use crate::models::{Session, SessionTemplate};
use crate::services::import::ImportItem;
use crate::time_utils::in_week;

/// Counters reported by a bulk import.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct BulkImportSummary {
    pub added: u32,
    pub updated: u32,
    pub skipped: u32,
}

/// Application-scoped session store. Constructed once at startup; tests
/// build fresh instances instead of sharing globals.
pub struct SessionStore {
    sessions: RwLock<Vec<Session>>,
    cache: FileCache,
    remote: RemoteStore,
    sync_error: RwLock<Option<String>>,
}

impl SessionStore {
    pub fn new(cache: FileCache, remote: RemoteStore) -> Self {
        Self {
            sessions: RwLock::new(Vec::new()),
            cache,
            remote,
            sync_error: RwLock::new(None),
        }
    }

    // ─── Lifecycle ───────────────────────────────────────────────

    /// Hydrate from the local cache, then replace state from the remote
    /// service when the fetch succeeds.
    ///
    /// A remote failure is non-fatal: cache-derived state stays usable
    /// and a sync-error flag is raised for the UI.
    pub async fn initialize(&self) {
        let snapshot = self.cache.load();
        let cached_count = snapshot.sessions.len();
        *self.sessions.write().await = snapshot.sessions;
        tracing::info!(count = cached_count, "Session store hydrated from cache");

        match self.remote.list_sessions().await {
            Ok(remote_sessions) => {
                tracing::info!(count = remote_sessions.len(), "Session store synced from remote");
                self.cache.store_sessions(&remote_sessions);
                *self.sessions.write().await = remote_sessions;
                *self.sync_error.write().await = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Remote fetch failed, keeping cached sessions");
                *self.sync_error.write().await = Some(e.to_string());
            }
        }
    }

    /// Last sync failure surfaced by `initialize`, if any.
    pub async fn sync_error(&self) -> Option<String> {
        self.sync_error.read().await.clone()
    }

    // ─── Read Accessors ──────────────────────────────────────────

    pub async fn all(&self) -> Vec<Session> {
        self.sessions.read().await.clone()
    }

    pub async fn get(&self, id: Uuid) -> Option<Session> {
        self.sessions.read().await.iter().find(|s| s.id == id).cloned()
    }

    /// Sessions within the week starting at `week_start` (Monday).
    pub async fn for_week(&self, week_start: NaiveDate) -> Vec<Session> {
        self.sessions
            .read()
            .await
            .iter()
            .filter(|s| in_week(s.date, week_start))
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    // ─── Mutations ───────────────────────────────────────────────

    /// Create a planned session from a template on `date`.
    pub async fn create(&self, template: SessionTemplate, date: NaiveDate) -> Session {
        let session = template.into_session(date);
        self.insert(session.clone()).await;
        session
    }

    /// Create a batch of planned sessions on `date`; one remote call
    /// covers the whole batch.
    pub async fn create_many(
        &self,
        templates: Vec<SessionTemplate>,
        date: NaiveDate,
    ) -> Vec<Session> {
        let created: Vec<Session> = templates
            .into_iter()
            .map(|t| {
                let day = t.date.unwrap_or(date);
                t.into_session(day)
            })
            .collect();

        let snapshot = {
            let mut sessions = self.sessions.write().await;
            sessions.extend(created.iter().cloned());
            sessions.clone()
        };
        self.cache.store_sessions(&snapshot);
        self.spawn_remote_upsert(created.clone());
        created
    }

    /// Append one session (any origin). Used by creation paths and by
    /// reconciliation inserts.
    pub async fn insert(&self, session: Session) {
        let snapshot = {
            let mut sessions = self.sessions.write().await;
            sessions.push(session.clone());
            sessions.clone()
        };
        self.cache.store_sessions(&snapshot);
        self.spawn_remote_upsert(vec![session]);
    }

    /// Overwrite the stored session `id` with `session`, preserving the
    /// original identifier. Returns false if `id` is unknown.
    pub async fn overwrite(&self, id: Uuid, mut session: Session) -> bool {
        session.id = id;
        let (found, snapshot) = {
            let mut sessions = self.sessions.write().await;
            match sessions.iter_mut().find(|s| s.id == id) {
                Some(slot) => {
                    *slot = session.clone();
                    (true, sessions.clone())
                }
                None => return false,
            }
        };
        debug_assert!(found);
        self.cache.store_sessions(&snapshot);
        self.spawn_remote_upsert(vec![session]);
        true
    }

    /// Reschedule a session. No-op (returns false) if `id` is unknown.
    pub async fn update_date(&self, id: Uuid, new_date: NaiveDate) -> bool {
        self.update_fields(id, |s| s.date = new_date).await
    }

    /// Attach or replace coach feedback.
    pub async fn update_feedback(&self, id: Uuid, text: Option<String>) -> bool {
        self.update_fields(id, |s| s.coach_feedback = text).await
    }

    /// Relabel a session (the only legal edit of an actual session's
    /// user-visible fields).
    pub async fn update_editable_fields(
        &self,
        id: Uuid,
        title: String,
        description: String,
    ) -> bool {
        self.update_fields(id, |s| {
            s.title = title;
            s.description = description;
        })
        .await
    }

    /// Remove a session from memory and cache; best-effort remote delete.
    ///
    /// This is the raw primitive: it deletes actual sessions too. The
    /// HTTP layer refuses deletion of actual sessions in normal flows;
    /// reconciliation calls this directly when displacing planned
    /// sessions.
    pub async fn remove(&self, id: Uuid) -> bool {
        let snapshot = {
            let mut sessions = self.sessions.write().await;
            let before = sessions.len();
            sessions.retain(|s| s.id != id);
            if sessions.len() == before {
                return false;
            }
            sessions.clone()
        };
        self.cache.store_sessions(&snapshot);
        self.spawn_remote_delete(vec![id]);
        true
    }

    /// Bulk JSON/template import.
    ///
    /// With `replace_existing`, every non-actual session whose date
    /// appears in the incoming batch is deleted first. Items are then
    /// matched by (title, date): a non-actual match is overwritten in
    /// place (identifier preserved); actual sessions are never
    /// overwritten; everything else is appended. Items carrying an id
    /// are trusted as full records (restore path); items without a date
    /// are skipped.
    pub async fn import_bulk(
        &self,
        items: Vec<ImportItem>,
        replace_existing: bool,
    ) -> BulkImportSummary {
        let mut summary = BulkImportSummary::default();
        let mut removed_ids: Vec<Uuid> = Vec::new();
        let mut touched: Vec<Session> = Vec::new();

        let snapshot = {
            let mut sessions = self.sessions.write().await;

            if replace_existing {
                let batch_dates: Vec<NaiveDate> =
                    items.iter().filter_map(|item| item.date()).collect();
                sessions.retain(|s| {
                    let displaced = !s.is_actual() && batch_dates.contains(&s.date);
                    if displaced {
                        removed_ids.push(s.id);
                    }
                    !displaced
                });
            }

            for item in items {
                let Some(date) = item.date() else {
                    tracing::warn!("Skipping import item without a date");
                    summary.skipped += 1;
                    continue;
                };

                let incoming = item.into_session(date);
                let matched = sessions
                    .iter_mut()
                    .find(|s| s.title == incoming.title && s.date == date);

                match matched {
                    Some(existing) if existing.is_actual() => {
                        // Actual sessions only yield to activity
                        // reconciliation, never to bulk import.
                        summary.skipped += 1;
                    }
                    Some(existing) => {
                        let id = existing.id;
                        let mut replacement = incoming;
                        replacement.id = id;
                        *existing = replacement.clone();
                        touched.push(replacement);
                        summary.updated += 1;
                    }
                    None => {
                        sessions.push(incoming.clone());
                        touched.push(incoming);
                        summary.added += 1;
                    }
                }
            }

            sessions.clone()
        };

        self.cache.store_sessions(&snapshot);
        if !removed_ids.is_empty() {
            self.spawn_remote_delete(removed_ids);
        }
        if !touched.is_empty() {
            self.spawn_remote_upsert(touched);
        }

        tracing::info!(
            added = summary.added,
            updated = summary.updated,
            skipped = summary.skipped,
            replace_existing,
            "Bulk import applied"
        );
        summary
    }

    /// Serialize all planned sessions to a portable document.
    pub async fn export_planned(&self) -> Vec<Session> {
        self.sessions
            .read()
            .await
            .iter()
            .filter(|s| s.is_planned())
            .cloned()
            .collect()
    }

    /// Full data wipe: memory, cache and a remote delete per known
    /// session.
    pub async fn reset(&self) {
        let ids: Vec<Uuid> = {
            let mut sessions = self.sessions.write().await;
            let ids = sessions.iter().map(|s| s.id).collect();
            sessions.clear();
            ids
        };
        self.cache.store_sessions(&[]);
        tracing::info!(count = ids.len(), "Session store reset");
        self.spawn_remote_delete(ids);
    }

    // ─── Internals ───────────────────────────────────────────────

    async fn update_fields<F: FnOnce(&mut Session)>(&self, id: Uuid, mutate: F) -> bool {
        let (updated, snapshot) = {
            let mut sessions = self.sessions.write().await;
            match sessions.iter_mut().find(|s| s.id == id) {
                Some(session) => {
                    mutate(session);
                    (session.clone(), sessions.clone())
                }
                None => return false,
            }
        };
        self.cache.store_sessions(&snapshot);
        self.spawn_remote_upsert(vec![updated]);
        true
    }

    /// Fire-and-forget remote upsert. Failures are logged for the next
    /// full resync to repair.
    fn spawn_remote_upsert(&self, sessions: Vec<Session>) {
        let remote = self.remote.clone();
        tokio::spawn(async move {
            if let Err(e) = remote.upsert_sessions(&sessions).await {
                tracing::warn!(
                    count = sessions.len(),
                    error = %e,
                    "Remote session upsert failed (local state kept)"
                );
            }
        });
    }

    /// Fire-and-forget remote delete.
    fn spawn_remote_delete(&self, ids: Vec<Uuid>) {
        if ids.is_empty() {
            return;
        }
        let remote = self.remote.clone();
        tokio::spawn(async move {
            if let Err(e) = remote.delete_sessions(&ids).await {
                tracing::warn!(
                    count = ids.len(),
                    error = %e,
                    "Remote session delete failed (local state kept)"
                );
            }
        });
    }
}
