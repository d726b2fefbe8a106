//! Database row models — these map to/from SQL rows.

use chrono::{DateTime, Utc};
use std::str::FromStr;

use sn_proto::note::{Note, NoteId};

use crate::error::StoreError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NoteRow {
    pub id: String,
    pub owner_id: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_encrypted: bool,
    pub is_private: bool,
    /// Packed envelope token for encrypted notes.
    pub data: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl NoteRow {
    pub fn into_note(self) -> Result<Note, StoreError> {
        Ok(Note {
            id: NoteId::from_str(&self.id)?,
            owner_id: self.owner_id,
            title: self.title,
            content: self.content,
            is_encrypted: self.is_encrypted,
            is_private: self.is_private,
            data: self.data,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QueueRow {
    pub seq: i64,
    pub note_id: String,
    pub kind: String,
    /// Note JSON for upserts/tombstones; empty for purges.
    pub payload: String,
    pub enqueued_at: DateTime<Utc>,
}
