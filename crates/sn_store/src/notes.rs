//! Note operations: upsert, lookup, soft delete, restore, retention sweep.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use sn_proto::note::{Note, NoteId};

use crate::db::Store;
use crate::error::StoreError;
use crate::models::NoteRow;

const SELECT_NOTE: &str = "SELECT id, owner_id, title, content, is_encrypted, is_private, data, \
     created_at, updated_at, deleted_at FROM notes";

impl Store {
    /// Full-record upsert keyed by id.
    ///
    /// Rejects any attempt to change `owner_id` on an existing id with
    /// `OwnershipViolation`; the transaction guarantees no partial write
    /// is observable on failure.
    pub async fn put(&self, note: &Note) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let stored: Option<(String,)> =
            sqlx::query_as("SELECT owner_id FROM notes WHERE id = ?")
                .bind(note.id.as_str())
                .fetch_optional(&mut *tx)
                .await?;
        if let Some((stored,)) = stored {
            if stored != note.owner_id {
                return Err(StoreError::OwnershipViolation {
                    id: note.id.to_string(),
                    stored,
                    attempted: note.owner_id.clone(),
                });
            }
        }

        sqlx::query(
            "INSERT INTO notes (id, owner_id, title, content, is_encrypted, is_private, data, \
             created_at, updated_at, deleted_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET \
             title = excluded.title, content = excluded.content, \
             is_encrypted = excluded.is_encrypted, is_private = excluded.is_private, \
             data = excluded.data, created_at = excluded.created_at, \
             updated_at = excluded.updated_at, deleted_at = excluded.deleted_at",
        )
        .bind(note.id.as_str())
        .bind(&note.owner_id)
        .bind(&note.title)
        .bind(&note.content)
        .bind(note.is_encrypted)
        .bind(note.is_private)
        .bind(&note.data)
        .bind(note.created_at)
        .bind(note.updated_at)
        .bind(note.deleted_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn get(&self, id: &NoteId) -> Result<Note, StoreError> {
        self.try_get(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    pub async fn try_get(&self, id: &NoteId) -> Result<Option<Note>, StoreError> {
        let row: Option<NoteRow> =
            sqlx::query_as(&format!("{SELECT_NOTE} WHERE id = ?"))
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await?;
        row.map(NoteRow::into_note).transpose()
    }

    /// Soft delete: stamps `deleted_at` (idempotent on already-deleted
    /// notes) and returns the tombstoned record.
    pub async fn soft_delete(&self, id: &NoteId, now: DateTime<Utc>) -> Result<Note, StoreError> {
        let note = self.get(id).await?;
        if note.deleted_at.is_some() {
            return Ok(note);
        }
        let stamped = note.with_deleted(now);
        self.put(&stamped).await?;
        debug!(note = %id, "note soft-deleted");
        Ok(stamped)
    }

    /// Restore a soft-deleted note while the retention window holds.
    pub async fn restore(
        &self,
        id: &NoteId,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<Note, StoreError> {
        let note = self.get(id).await?;
        let Some(deleted_at) = note.deleted_at else {
            return Ok(note);
        };
        if now - deleted_at > window {
            return Err(StoreError::RetentionExpired(id.to_string()));
        }
        let restored = note.with_restored(now);
        self.put(&restored).await?;
        debug!(note = %id, "note restored");
        Ok(restored)
    }

    /// All notes, newest first. Tombstoned notes are included only on
    /// request.
    pub async fn list(&self, include_deleted: bool) -> Result<Vec<Note>, StoreError> {
        let sql = if include_deleted {
            format!("{SELECT_NOTE} ORDER BY updated_at DESC")
        } else {
            format!("{SELECT_NOTE} WHERE deleted_at IS NULL ORDER BY updated_at DESC")
        };
        let rows: Vec<NoteRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(NoteRow::into_note).collect()
    }

    /// Permanently remove every note whose tombstone has outlived the
    /// retention window. The only irreversible deletion in the store.
    ///
    /// Returns the purged records so the caller can propagate removal to
    /// a remote mirror.
    pub async fn purge_expired(
        &self,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<Note>, StoreError> {
        let cutoff = now - window;
        let mut tx = self.pool.begin().await?;

        let rows: Vec<NoteRow> = sqlx::query_as(&format!(
            "{SELECT_NOTE} WHERE deleted_at IS NOT NULL AND deleted_at < ?"
        ))
        .bind(cutoff)
        .fetch_all(&mut *tx)
        .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query("DELETE FROM notes WHERE deleted_at IS NOT NULL AND deleted_at < ?")
            .bind(cutoff)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let purged: Vec<Note> = rows
            .into_iter()
            .map(NoteRow::into_note)
            .collect::<Result<_, _>>()?;
        info!(count = purged.len(), "retention sweep purged notes");
        Ok(purged)
    }
}
