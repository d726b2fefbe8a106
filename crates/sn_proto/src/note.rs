//! Note records.
//!
//! A note is mutated only by whole-record replacement — the helpers here
//! return a new record rather than patching fields in place. `updated_at`
//! is the sole conflict-resolution input, so every replacement advances it
//! strictly, even when the wall clock stands still or runs backwards.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ProtoError;

/// Raw entropy behind a note id.
pub const NOTE_ID_BYTES: usize = 16;

/// Opaque note identifier: 16 random bytes as fixed-width lowercase hex.
/// Immutable for the note's lifetime and never reused after a purge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    pub fn generate() -> Result<NoteId, ProtoError> {
        let mut raw = [0u8; NOTE_ID_BYTES];
        rand::rngs::OsRng
            .try_fill_bytes(&mut raw)
            .map_err(|e| ProtoError::Rng(e.to_string()))?;
        Ok(NoteId(hex::encode(raw)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NoteId {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = s.len() == NOTE_ID_BYTES * 2
            && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !valid {
            return Err(ProtoError::InvalidNoteId(s.to_string()));
        }
        Ok(NoteId(s.to_string()))
    }
}

/// A user-visible note record.
///
/// Exactly one of two shapes, fixed at creation:
/// - plaintext: `title`/`content` set, `data` empty, `is_encrypted` false;
/// - encrypted: `data` holds the packed envelope token, `title`/`content`
///   empty, `is_encrypted` true.
///
/// A note never transitions between the two in place — encrypting an
/// existing note means creating a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    /// Creating profile. No operation may change this.
    pub owner_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub is_encrypted: bool,
    /// Private notes are never offered to the sync engine.
    pub is_private: bool,
    /// Packed envelope token (encrypted notes only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-deletion stamp; `None` means active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Note {
    pub fn new_plaintext(
        owner_id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        is_private: bool,
        now: DateTime<Utc>,
    ) -> Result<Note, ProtoError> {
        Ok(Note {
            id: NoteId::generate()?,
            owner_id: owner_id.into(),
            title: Some(title.into()),
            content: Some(content.into()),
            is_encrypted: false,
            is_private,
            data: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
    }

    pub fn new_encrypted(
        owner_id: impl Into<String>,
        token: impl Into<String>,
        is_private: bool,
        now: DateTime<Utc>,
    ) -> Result<Note, ProtoError> {
        Ok(Note {
            id: NoteId::generate()?,
            owner_id: owner_id.into(),
            title: None,
            content: None,
            is_encrypted: true,
            is_private,
            data: Some(token.into()),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
    }

    /// Replacement record for a plaintext edit.
    pub fn edited_plaintext(
        &self,
        title: impl Into<String>,
        content: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Note, ProtoError> {
        if self.is_encrypted {
            return Err(ProtoError::InvalidNote(
                "plaintext edit of an encrypted note".into(),
            ));
        }
        let mut next = self.clone();
        next.title = Some(title.into());
        next.content = Some(content.into());
        next.updated_at = self.advanced(now);
        Ok(next)
    }

    /// Replacement record for an encrypted edit (a freshly packed token).
    pub fn edited_encrypted(
        &self,
        token: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Note, ProtoError> {
        if !self.is_encrypted {
            return Err(ProtoError::InvalidNote(
                "encrypted edit of a plaintext note".into(),
            ));
        }
        let mut next = self.clone();
        next.data = Some(token.into());
        next.updated_at = self.advanced(now);
        Ok(next)
    }

    /// Tombstoned replacement. `deleted_at` and `updated_at` share the
    /// stamp so the tombstone itself wins last-writer-wins downstream.
    pub fn with_deleted(&self, now: DateTime<Utc>) -> Note {
        let stamp = self.advanced(now);
        let mut next = self.clone();
        next.deleted_at = Some(stamp);
        next.updated_at = stamp;
        next
    }

    /// Restored replacement; clears the tombstone.
    pub fn with_restored(&self, now: DateTime<Utc>) -> Note {
        let mut next = self.clone();
        next.deleted_at = None;
        next.updated_at = self.advanced(now);
        next
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Whether this note is ever offered for remote mirroring.
    pub fn syncable(&self) -> bool {
        !self.is_private
    }

    /// `updated_at` may never move backwards. When the clock has not
    /// advanced past the current stamp, step one millisecond instead.
    fn advanced(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::milliseconds(1)
        }
    }
}
