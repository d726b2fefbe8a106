//! The sync engine.
//!
//! Owns the outbound queue semantics and the last-writer-wins merge.
//! Local writes go through `save`/`delete`/`restore` so that every
//! mutation of a syncable note lands in the persisted queue; the queue is
//! drained opportunistically and may be drained any number of times —
//! the merge rule keeps re-application idempotent.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use sn_proto::note::{Note, NoteId};
use sn_store::{Mutation, Store};

use crate::error::SyncError;
use crate::remote::{RemoteDocument, RemoteError, RemoteStore};
use crate::settings::SyncSettings;

pub struct SyncEngine {
    store: Store,
    remote: Arc<dyn RemoteStore>,
    settings: SyncSettings,
}

/// Outcome of one drain pass.
#[derive(Debug, Default, Clone)]
pub struct DrainReport {
    /// Mutations applied remotely (local won or document was new).
    pub pushed: usize,
    /// Remote-wins merges pulled into the local store instead.
    pub pulled: usize,
    /// Entries already consistent with the remote.
    pub noop: usize,
    /// Entries dropped because the remote refused access.
    pub auth_failures: Vec<NoteId>,
    /// Entries dropped because the remote copy has a foreign owner.
    pub conflicts: Vec<NoteId>,
    /// Transient failure that ended the pass early, if any. Undrained
    /// entries stay queued for the next pass.
    pub interrupted: Option<String>,
}

impl DrainReport {
    pub fn is_clean(&self) -> bool {
        self.auth_failures.is_empty() && self.conflicts.is_empty() && self.interrupted.is_none()
    }
}

/// Outcome of a discovery pull.
#[derive(Debug, Default, Clone)]
pub struct PullReport {
    pub applied: usize,
    pub skipped: usize,
    pub conflicts: Vec<NoteId>,
}

impl SyncEngine {
    pub fn new(store: Store, remote: Arc<dyn RemoteStore>, settings: SyncSettings) -> Self {
        Self {
            store,
            remote,
            settings,
        }
    }

    // ── Local write paths ───────────────────────────────────────────────────

    /// Persist locally, then queue for mirroring unless the note is
    /// private. Never blocks on the remote.
    pub async fn save(&self, note: &Note) -> Result<(), SyncError> {
        self.store.put(note).await?;
        if note.syncable() {
            let mutation = if note.is_active() {
                Mutation::Upsert(note.clone())
            } else {
                Mutation::Tombstone(note.clone())
            };
            self.store.queue_push(&mutation, Utc::now()).await?;
        }
        Ok(())
    }

    /// Soft-delete locally and queue the tombstone.
    pub async fn delete(&self, id: &NoteId, now: DateTime<Utc>) -> Result<Note, SyncError> {
        let stamped = self.store.soft_delete(id, now).await?;
        if stamped.syncable() {
            self.store
                .queue_push(&Mutation::Tombstone(stamped.clone()), Utc::now())
                .await?;
        }
        Ok(stamped)
    }

    /// Restore locally (within the retention window) and queue the
    /// revived record.
    pub async fn restore(
        &self,
        id: &NoteId,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<Note, SyncError> {
        let restored = self.store.restore(id, now, window).await?;
        if restored.syncable() {
            self.store
                .queue_push(&Mutation::Upsert(restored.clone()), Utc::now())
                .await?;
        }
        Ok(restored)
    }

    /// Run the retention sweep and queue remote removal for every purged
    /// note that was ever mirrored. The queue survives restarts, so the
    /// remote copy is removed even when the sweep ran offline.
    pub async fn purge_expired(
        &self,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<NoteId>, SyncError> {
        let purged = self.store.purge_expired(window, now).await?;
        let mut ids = Vec::with_capacity(purged.len());
        for note in purged {
            if note.syncable() {
                self.store
                    .queue_push(&Mutation::Purge(note.id.clone()), Utc::now())
                    .await?;
            }
            ids.push(note.id);
        }
        Ok(ids)
    }

    // ── Drain ───────────────────────────────────────────────────────────────

    /// Drain the outbound queue once, in first-enqueue order.
    ///
    /// A transient failure ends the pass with the remaining entries
    /// queued; cancellation between remote calls does the same. Entries
    /// are removed only after the remote acknowledged them (or after a
    /// failure that cannot succeed on retry).
    pub async fn drain(&self, cancel: &CancellationToken) -> Result<DrainReport, SyncError> {
        let mut report = DrainReport::default();
        let entries = self.store.queue_entries().await?;
        if !entries.is_empty() {
            debug!(pending = entries.len(), "drain pass started");
        }
        for entry in entries {
            if cancel.is_cancelled() {
                debug!("drain cancelled; remaining mutations stay queued");
                break;
            }
            match self.push_mutation(&entry.mutation, &mut report).await {
                Ok(()) => {
                    self.store
                        .queue_remove(entry.seq, entry.enqueued_at)
                        .await?;
                }
                Err(SyncError::Remote(RemoteError::Transient(reason))) => {
                    debug!(%reason, "transient failure; mutations stay queued for retry");
                    report.interrupted = Some(reason);
                    break;
                }
                Err(other) => return Err(other),
            }
        }
        Ok(report)
    }

    /// Push one mutation. `Ok` means the entry is settled (acknowledged,
    /// superseded by a remote-wins merge, or dropped as unretryable);
    /// a transient error propagates so the caller keeps the entry.
    async fn push_mutation(
        &self,
        mutation: &Mutation,
        report: &mut DrainReport,
    ) -> Result<(), SyncError> {
        match mutation {
            Mutation::Purge(id) => match self.remote.delete(id.as_str()).await {
                Ok(()) => {
                    report.pushed += 1;
                    Ok(())
                }
                Err(RemoteError::NotFound(_)) => {
                    report.noop += 1;
                    Ok(())
                }
                Err(RemoteError::Unauthorized(_)) => {
                    warn!(note = %id, "remote refused purge; dropping queue entry");
                    report.auth_failures.push(id.clone());
                    Ok(())
                }
                Err(e @ RemoteError::Transient(_)) => Err(e.into()),
            },
            Mutation::Upsert(note) | Mutation::Tombstone(note) => {
                self.push_note(note, report).await
            }
        }
    }

    async fn push_note(&self, note: &Note, report: &mut DrainReport) -> Result<(), SyncError> {
        let current = match self.remote.get(note.id.as_str()).await {
            Ok(doc) => Some(doc),
            Err(RemoteError::NotFound(_)) => None,
            Err(RemoteError::Unauthorized(_)) => {
                warn!(note = %note.id, "remote refused access; dropping queue entry");
                report.auth_failures.push(note.id.clone());
                return Ok(());
            }
            Err(e @ RemoteError::Transient(_)) => return Err(e.into()),
        };

        match current {
            // Remote is strictly newer: it wins. Merge its copy into the
            // local store instead of pushing ours.
            Some(doc) if doc.updated_at > note.updated_at => {
                match self.apply_remote(doc).await {
                    Ok(applied) => {
                        if applied {
                            report.pulled += 1;
                        } else {
                            report.noop += 1;
                        }
                        Ok(())
                    }
                    Err(SyncError::ConflictViolation { id, local, remote }) => {
                        warn!(note = %id, %local, %remote, "owner conflict during drain; dropping queue entry");
                        report.conflicts.push(NoteId::from_str(&id)?);
                        Ok(())
                    }
                    Err(e) => Err(e),
                }
            }
            // Equal stamps: already consistent.
            Some(doc) if doc.updated_at == note.updated_at => {
                report.noop += 1;
                Ok(())
            }
            // Local wins (or the document is new): apply remotely.
            _ => match self.remote.put(RemoteDocument::from_note(note)).await {
                Ok(()) => {
                    report.pushed += 1;
                    Ok(())
                }
                Err(RemoteError::Unauthorized(_)) => {
                    warn!(note = %note.id, "remote refused write; dropping queue entry");
                    report.auth_failures.push(note.id.clone());
                    Ok(())
                }
                Err(e) => Err(e.into()),
            },
        }
    }

    // ── Pull ────────────────────────────────────────────────────────────────

    /// Discovery pull: list the remote's documents for `owner_id` and
    /// merge each one under the same last-writer-wins rule.
    pub async fn pull_all(&self, owner_id: &str) -> Result<PullReport, SyncError> {
        let docs = self.remote.list(owner_id).await?;

        // A locally purged note may still be listed until its queued
        // purge drains; applying it would resurrect the record.
        let pending_purges: HashSet<String> = self
            .store
            .queue_entries()
            .await?
            .into_iter()
            .filter(|e| matches!(e.mutation, Mutation::Purge(_)))
            .map(|e| e.mutation.note_id().to_string())
            .collect();

        let mut report = PullReport::default();
        for doc in docs {
            if pending_purges.contains(&doc.id) {
                report.skipped += 1;
                continue;
            }
            match self.apply_remote(doc).await {
                Ok(true) => report.applied += 1,
                Ok(false) => report.skipped += 1,
                Err(SyncError::ConflictViolation { id, local, remote }) => {
                    warn!(note = %id, %local, %remote, "rejected pulled document with foreign owner");
                    report.conflicts.push(NoteId::from_str(&id)?);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(report)
    }

    /// Merge one pulled document into the local store. Returns whether a
    /// write happened. The write goes straight to the store — merges are
    /// never re-queued, so pushes cannot echo.
    async fn apply_remote(&self, doc: RemoteDocument) -> Result<bool, SyncError> {
        let incoming = doc.into_note()?;
        match self.store.try_get(&incoming.id).await? {
            None => {
                self.store.put(&incoming).await?;
                Ok(true)
            }
            Some(local) => {
                if local.owner_id != incoming.owner_id {
                    return Err(SyncError::ConflictViolation {
                        id: incoming.id.to_string(),
                        local: local.owner_id,
                        remote: incoming.owner_id,
                    });
                }
                if incoming.updated_at > local.updated_at {
                    self.store.put(&incoming).await?;
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
        }
    }

    // ── Loop ────────────────────────────────────────────────────────────────

    /// Periodic drain until cancelled. Cancellation stops the loop
    /// without touching queue state: anything not yet acknowledged by
    /// the remote stays queued.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.settings.drain_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            interval_secs = self.settings.drain_interval_secs,
            "sync loop started"
        );
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("sync loop stopped");
                    break;
                }
                _ = ticker.tick() => {
                    match self.drain(&cancel).await {
                        Ok(report) if !report.is_clean() => {
                            debug!(?report, "drain pass finished with leftovers");
                        }
                        Ok(_) => {}
                        Err(e) => warn!(error = %e, "drain pass failed"),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::InMemoryRemote;
    use chrono::TimeZone;

    async fn engine_with(
        remote: &InMemoryRemote,
    ) -> (SyncEngine, Store, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::open(&dir.path().join("notes.db"))
            .await
            .expect("open store");
        let engine = SyncEngine::new(
            store.clone(),
            Arc::new(remote.clone()),
            SyncSettings::default(),
        );
        (engine, store, dir)
    }

    fn t(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[tokio::test]
    async fn local_note_reaches_remote() {
        let remote = InMemoryRemote::new();
        let (engine, store, _dir) = engine_with(&remote).await;
        let note = Note::new_plaintext("alice", "t", "c", false, t(100)).unwrap();

        engine.save(&note).await.unwrap();
        let report = engine.drain(&CancellationToken::new()).await.unwrap();

        assert_eq!(report.pushed, 1);
        assert!(report.is_clean());
        assert_eq!(store.queue_len().await.unwrap(), 0);
        let doc = remote.document(note.id.as_str()).await.unwrap();
        assert_eq!(doc.updated_at, t(100));
        assert_eq!(doc.content.as_deref(), Some("c"));
    }

    #[tokio::test]
    async fn private_note_is_never_offered() {
        let remote = InMemoryRemote::new();
        let (engine, store, _dir) = engine_with(&remote).await;
        let note = Note::new_plaintext("alice", "t", "c", true, t(100)).unwrap();

        engine.save(&note).await.unwrap();
        assert_eq!(store.queue_len().await.unwrap(), 0);
        engine.drain(&CancellationToken::new()).await.unwrap();
        assert_eq!(remote.document_count().await, 0);
    }

    #[tokio::test]
    async fn tombstone_propagates() {
        let remote = InMemoryRemote::new();
        let (engine, _store, _dir) = engine_with(&remote).await;
        let note = Note::new_plaintext("alice", "t", "c", false, t(100)).unwrap();
        engine.save(&note).await.unwrap();
        engine.drain(&CancellationToken::new()).await.unwrap();

        engine.delete(&note.id, t(200)).await.unwrap();
        let report = engine.drain(&CancellationToken::new()).await.unwrap();
        assert_eq!(report.pushed, 1);

        let doc = remote.document(note.id.as_str()).await.unwrap();
        assert_eq!(doc.deleted_at, Some(t(200)));
        assert_eq!(doc.updated_at, t(200));
    }

    #[tokio::test]
    async fn strictly_newer_remote_wins_on_push() {
        let remote = InMemoryRemote::new();
        let (engine, store, _dir) = engine_with(&remote).await;
        let note = Note::new_plaintext("alice", "t", "local", false, t(200)).unwrap();
        engine.save(&note).await.unwrap();

        let mut remote_copy = RemoteDocument::from_note(&note);
        remote_copy.content = Some("remote".into());
        remote_copy.updated_at = t(300);
        remote.insert(remote_copy).await;

        let report = engine.drain(&CancellationToken::new()).await.unwrap();
        assert_eq!(report.pulled, 1);
        assert_eq!(report.pushed, 0);

        // Local store took the remote version; remote kept its own.
        assert_eq!(
            store.get(&note.id).await.unwrap().content.as_deref(),
            Some("remote")
        );
        let doc = remote.document(note.id.as_str()).await.unwrap();
        assert_eq!(doc.content.as_deref(), Some("remote"));
    }

    #[tokio::test]
    async fn equal_stamps_are_a_noop() {
        let remote = InMemoryRemote::new();
        let (engine, store, _dir) = engine_with(&remote).await;
        let note = Note::new_plaintext("alice", "t", "c", false, t(200)).unwrap();
        engine.save(&note).await.unwrap();
        remote.insert(RemoteDocument::from_note(&note)).await;

        let report = engine.drain(&CancellationToken::new()).await.unwrap();
        assert_eq!(report.noop, 1);
        assert_eq!(report.pushed + report.pulled, 0);
        assert_eq!(store.queue_len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn transient_failure_keeps_entries_queued() {
        let remote = InMemoryRemote::new();
        let (engine, store, _dir) = engine_with(&remote).await;
        let note = Note::new_plaintext("alice", "t", "c", false, t(100)).unwrap();
        engine.save(&note).await.unwrap();

        remote.set_offline(true).await;
        let report = engine.drain(&CancellationToken::new()).await.unwrap();
        assert!(report.interrupted.is_some());
        assert_eq!(report.pushed, 0);
        assert_eq!(store.queue_len().await.unwrap(), 1);

        // Reconnect: the same entry drains.
        remote.set_offline(false).await;
        let report = engine.drain(&CancellationToken::new()).await.unwrap();
        assert_eq!(report.pushed, 1);
        assert_eq!(store.queue_len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unauthorized_drops_only_that_entry() {
        let remote = InMemoryRemote::new();
        let (engine, store, _dir) = engine_with(&remote).await;
        let denied = Note::new_plaintext("alice", "denied", "c", false, t(100)).unwrap();
        let allowed = Note::new_plaintext("alice", "allowed", "c", false, t(100)).unwrap();
        engine.save(&denied).await.unwrap();
        engine.save(&allowed).await.unwrap();
        remote.deny(denied.id.as_str()).await;

        let report = engine.drain(&CancellationToken::new()).await.unwrap();
        assert_eq!(report.auth_failures, vec![denied.id.clone()]);
        assert_eq!(report.pushed, 1);
        assert_eq!(store.queue_len().await.unwrap(), 0);
        assert!(remote.document(allowed.id.as_str()).await.is_some());
        assert!(remote.document(denied.id.as_str()).await.is_none());
    }

    #[tokio::test]
    async fn cancellation_leaves_queue_intact() {
        let remote = InMemoryRemote::new();
        let (engine, store, _dir) = engine_with(&remote).await;
        let note = Note::new_plaintext("alice", "t", "c", false, t(100)).unwrap();
        engine.save(&note).await.unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let report = engine.drain(&cancel).await.unwrap();
        assert_eq!(report.pushed, 0);
        assert_eq!(store.queue_len().await.unwrap(), 1);
        assert_eq!(remote.document_count().await, 0);
    }

    #[tokio::test]
    async fn purge_removes_the_remote_document() {
        let remote = InMemoryRemote::new();
        let (engine, store, _dir) = engine_with(&remote).await;
        let note = Note::new_plaintext("alice", "t", "c", false, t(0)).unwrap();
        engine.save(&note).await.unwrap();
        engine.drain(&CancellationToken::new()).await.unwrap();
        engine.delete(&note.id, t(0)).await.unwrap();
        engine.drain(&CancellationToken::new()).await.unwrap();

        let window = Duration::days(7);
        let purged = engine
            .purge_expired(window, t(8 * 24 * 60 * 60 * 1000))
            .await
            .unwrap();
        assert_eq!(purged, vec![note.id.clone()]);

        engine.drain(&CancellationToken::new()).await.unwrap();
        assert!(remote.document(note.id.as_str()).await.is_none());
        assert!(store.try_get(&note.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn pull_rejects_foreign_owner() {
        let remote = InMemoryRemote::new();
        let (engine, store, _dir) = engine_with(&remote).await;
        let note = Note::new_plaintext("alice", "t", "mine", false, t(100)).unwrap();
        engine.save(&note).await.unwrap();

        let mut foreign = RemoteDocument::from_note(&note);
        foreign.owner_id = "mallory".into();
        foreign.content = Some("theirs".into());
        foreign.updated_at = t(999);
        remote.insert(foreign).await;

        let report = engine.pull_all("mallory").await.unwrap();
        assert_eq!(report.conflicts, vec![note.id.clone()]);
        assert_eq!(report.applied, 0);
        // Local copy untouched.
        let local = store.get(&note.id).await.unwrap();
        assert_eq!(local.owner_id, "alice");
        assert_eq!(local.content.as_deref(), Some("mine"));
    }

    #[tokio::test]
    async fn pull_applies_unknown_and_newer_documents() {
        let remote = InMemoryRemote::new();
        let (engine, store, _dir) = engine_with(&remote).await;
        let foreign_note = Note::new_plaintext("alice", "t", "from-elsewhere", false, t(100)).unwrap();
        remote.insert(RemoteDocument::from_note(&foreign_note)).await;

        let report = engine.pull_all("alice").await.unwrap();
        assert_eq!(report.applied, 1);
        let local = store.get(&foreign_note.id).await.unwrap();
        assert_eq!(local.content.as_deref(), Some("from-elsewhere"));
        assert!(!local.is_private);

        // Second pull: nothing newer, nothing applied.
        let report = engine.pull_all("alice").await.unwrap();
        assert_eq!(report.applied, 0);
        assert_eq!(report.skipped, 1);
    }

    #[tokio::test]
    async fn queued_purge_blocks_resurrection_by_pull() {
        let remote = InMemoryRemote::new();
        let (engine, store, _dir) = engine_with(&remote).await;
        let note = Note::new_plaintext("alice", "t", "c", false, t(0)).unwrap();
        engine.save(&note).await.unwrap();
        engine.drain(&CancellationToken::new()).await.unwrap();
        engine.delete(&note.id, t(0)).await.unwrap();
        engine.drain(&CancellationToken::new()).await.unwrap();
        engine
            .purge_expired(Duration::days(7), t(8 * 24 * 60 * 60 * 1000))
            .await
            .unwrap();

        // Purge queued but not yet drained: the remote still lists the
        // document, but pulling must not bring it back.
        let report = engine.pull_all("alice").await.unwrap();
        assert_eq!(report.applied, 0);
        assert!(store.try_get(&note.id).await.unwrap().is_none());
    }
}
