//! Persisted outbound queue.
//!
//! One row per note id: a later mutation for the same id replaces the
//! payload (only the final state needs to cross the network) while `seq`
//! keeps the first-enqueue position, so drain order is stable. The sync
//! engine owns the semantics; this module owns the table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use sn_proto::note::{Note, NoteId};

use crate::db::Store;
use crate::error::StoreError;
use crate::models::QueueRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Upsert,
    Tombstone,
    Purge,
}

impl MutationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MutationKind::Upsert => "upsert",
            MutationKind::Tombstone => "tombstone",
            MutationKind::Purge => "purge",
        }
    }

    fn parse(s: &str) -> Result<Self, StoreError> {
        match s {
            "upsert" => Ok(MutationKind::Upsert),
            "tombstone" => Ok(MutationKind::Tombstone),
            "purge" => Ok(MutationKind::Purge),
            other => Err(StoreError::Migration(format!(
                "unknown queue mutation kind: {other}"
            ))),
        }
    }
}

/// A pending remote mutation. Idempotent on the remote: re-sending has
/// the same effect as sending once.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Mirror the record (create or overwrite, LWW-guarded).
    Upsert(Note),
    /// Mirror a soft deletion — the tombstoned record, `deleted_at` set.
    Tombstone(Note),
    /// Remove the document outright after a retention sweep.
    Purge(NoteId),
}

impl Mutation {
    pub fn note_id(&self) -> &NoteId {
        match self {
            Mutation::Upsert(note) | Mutation::Tombstone(note) => &note.id,
            Mutation::Purge(id) => id,
        }
    }

    pub fn kind(&self) -> MutationKind {
        match self {
            Mutation::Upsert(_) => MutationKind::Upsert,
            Mutation::Tombstone(_) => MutationKind::Tombstone,
            Mutation::Purge(_) => MutationKind::Purge,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub seq: i64,
    pub mutation: Mutation,
    pub enqueued_at: DateTime<Utc>,
}

impl Store {
    /// Append a mutation, coalescing with any queued one for the same id.
    pub async fn queue_push(
        &self,
        mutation: &Mutation,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let payload = match mutation {
            Mutation::Upsert(note) | Mutation::Tombstone(note) => serde_json::to_string(note)?,
            Mutation::Purge(_) => String::new(),
        };
        sqlx::query(
            "INSERT INTO sync_queue (note_id, kind, payload, enqueued_at) VALUES (?, ?, ?, ?) \
             ON CONFLICT(note_id) DO UPDATE SET kind = excluded.kind, \
             payload = excluded.payload, enqueued_at = excluded.enqueued_at",
        )
        .bind(mutation.note_id().as_str())
        .bind(mutation.kind().as_str())
        .bind(payload)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Pending entries in first-enqueue order.
    pub async fn queue_entries(&self) -> Result<Vec<QueueEntry>, StoreError> {
        let rows: Vec<QueueRow> = sqlx::query_as(
            "SELECT seq, note_id, kind, payload, enqueued_at FROM sync_queue ORDER BY seq ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(entry_from_row).collect()
    }

    /// Remove a drained entry — only if it has not been coalesced over
    /// since it was read (a newer payload stays queued).
    pub async fn queue_remove(
        &self,
        seq: i64,
        enqueued_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sync_queue WHERE seq = ? AND enqueued_at = ?")
            .bind(seq)
            .bind(enqueued_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn queue_len(&self) -> Result<usize, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sync_queue")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}

fn entry_from_row(row: QueueRow) -> Result<QueueEntry, StoreError> {
    let mutation = match MutationKind::parse(&row.kind)? {
        MutationKind::Upsert => Mutation::Upsert(serde_json::from_str(&row.payload)?),
        MutationKind::Tombstone => Mutation::Tombstone(serde_json::from_str(&row.payload)?),
        MutationKind::Purge => Mutation::Purge(NoteId::from_str(&row.note_id)?),
    };
    Ok(QueueEntry {
        seq: row.seq,
        mutation,
        enqueued_at: row.enqueued_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    async fn temp_store() -> (Store, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::open(&dir.path().join("notes.db"))
            .await
            .expect("open store");
        (store, dir)
    }

    fn t(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[tokio::test]
    async fn coalescing_keeps_first_enqueue_order() {
        let (store, _dir) = temp_store().await;
        let a = Note::new_plaintext("o", "a", "1", false, t(100)).unwrap();
        let b = Note::new_plaintext("o", "b", "1", false, t(100)).unwrap();

        store.queue_push(&Mutation::Upsert(a.clone()), t(100)).await.unwrap();
        store.queue_push(&Mutation::Upsert(b.clone()), t(110)).await.unwrap();

        // A mutates again: payload replaced, position kept.
        let a2 = a.edited_plaintext("a", "2", t(120)).unwrap();
        store.queue_push(&Mutation::Upsert(a2.clone()), t(120)).await.unwrap();

        let entries = store.queue_entries().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].mutation, Mutation::Upsert(a2));
        assert_eq!(entries[1].mutation, Mutation::Upsert(b));
        assert!(entries[0].seq < entries[1].seq);
    }

    #[tokio::test]
    async fn tombstone_and_purge_coalesce_over_upserts() {
        let (store, _dir) = temp_store().await;
        let note = Note::new_plaintext("o", "t", "c", false, t(100)).unwrap();
        store.queue_push(&Mutation::Upsert(note.clone()), t(100)).await.unwrap();

        let dead = note.with_deleted(t(200));
        store.queue_push(&Mutation::Tombstone(dead.clone()), t(200)).await.unwrap();
        let entries = store.queue_entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].mutation, Mutation::Tombstone(dead));

        store.queue_push(&Mutation::Purge(note.id.clone()), t(300)).await.unwrap();
        let entries = store.queue_entries().await.unwrap();
        assert_eq!(entries[0].mutation, Mutation::Purge(note.id.clone()));
        assert_eq!(store.queue_len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn remove_skips_entries_coalesced_after_read() {
        let (store, _dir) = temp_store().await;
        let note = Note::new_plaintext("o", "t", "c", false, t(100)).unwrap();
        store.queue_push(&Mutation::Upsert(note.clone()), t(100)).await.unwrap();

        let entry = store.queue_entries().await.unwrap().remove(0);

        // Coalesce a newer state in before the drained entry is removed.
        let newer = note.edited_plaintext("t", "c2", t(200)).unwrap();
        store.queue_push(&Mutation::Upsert(newer), t(200)).await.unwrap();

        store.queue_remove(entry.seq, entry.enqueued_at).await.unwrap();
        // The newer payload is still queued.
        assert_eq!(store.queue_len().await.unwrap(), 1);

        // A clean remove drains it.
        let entry = store.queue_entries().await.unwrap().remove(0);
        store.queue_remove(entry.seq, entry.enqueued_at).await.unwrap();
        assert_eq!(store.queue_len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn queue_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.db");
        let note = Note::new_plaintext("o", "t", "c", false, t(100)).unwrap();
        {
            let store = Store::open(&path).await.unwrap();
            store.queue_push(&Mutation::Upsert(note.clone()), t(100)).await.unwrap();
        }
        let store = Store::open(&path).await.unwrap();
        let entries = store.queue_entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].mutation, Mutation::Upsert(note));
    }
}
