//! Remote store boundary.
//!
//! The remote is an opaque keyed document service: get/put/delete by note
//! id, plus listing for discovery only — correctness never depends on the
//! remote being able to query. Transport and authorization live behind
//! the trait; the engine sees three error classes and nothing else.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use sn_proto::note::{Note, NoteId};

use crate::error::SyncError;

/// Document shape at the remote boundary. `isPrivate` is deliberately
/// absent — private notes never reach a remote, so the flag is
/// device-local state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDocument {
    pub id: String,
    pub owner_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub is_encrypted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl RemoteDocument {
    pub fn from_note(note: &Note) -> Self {
        Self {
            id: note.id.to_string(),
            owner_id: note.owner_id.clone(),
            title: note.title.clone(),
            content: note.content.clone(),
            is_encrypted: note.is_encrypted,
            data: note.data.clone(),
            created_at: note.created_at,
            updated_at: note.updated_at,
            deleted_at: note.deleted_at,
        }
    }

    /// Back into a local record. Anything that arrived from a remote is,
    /// by construction, not private.
    pub fn into_note(self) -> Result<Note, SyncError> {
        Ok(Note {
            id: NoteId::from_str(&self.id)?,
            owner_id: self.owner_id,
            title: self.title,
            content: self.content,
            is_encrypted: self.is_encrypted,
            is_private: false,
            data: self.data,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        })
    }
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("document not found: {0}")]
    NotFound(String),

    /// Cannot succeed on retry with the same credential; the engine drops
    /// the affected queue entry and surfaces the id.
    #[error("not authorized for document {0}")]
    Unauthorized(String),

    /// Retried automatically on the next drain; never fatal, local data
    /// stays authoritative.
    #[error("transient network failure: {0}")]
    Transient(String),
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<RemoteDocument, RemoteError>;
    async fn put(&self, doc: RemoteDocument) -> Result<(), RemoteError>;
    async fn delete(&self, id: &str) -> Result<(), RemoteError>;
    /// Discovery only.
    async fn list(&self, owner_id: &str) -> Result<Vec<RemoteDocument>, RemoteError>;
}

// ── In-memory remote ────────────────────────────────────────────────────────

#[derive(Default)]
struct MemoryState {
    docs: HashMap<String, RemoteDocument>,
    offline: bool,
    denied: HashSet<String>,
}

/// In-memory `RemoteStore` — the remote for tests and for local-only
/// deployments that still want the full sync path exercised. Failure
/// injection (`set_offline`, `deny`) drives the engine's error handling
/// in tests.
#[derive(Clone, Default)]
pub struct InMemoryRemote {
    inner: Arc<RwLock<MemoryState>>,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline, every call fails `Transient`.
    pub async fn set_offline(&self, offline: bool) {
        self.inner.write().await.offline = offline;
    }

    /// Any access to `id` fails `Unauthorized`.
    pub async fn deny(&self, id: &str) {
        self.inner.write().await.denied.insert(id.to_string());
    }

    /// Direct read past the failure switches, for assertions.
    pub async fn document(&self, id: &str) -> Option<RemoteDocument> {
        self.inner.read().await.docs.get(id).cloned()
    }

    /// Seed a document directly, bypassing the sync path.
    pub async fn insert(&self, doc: RemoteDocument) {
        self.inner.write().await.docs.insert(doc.id.clone(), doc);
    }

    pub async fn document_count(&self) -> usize {
        self.inner.read().await.docs.len()
    }
}

fn check(state: &MemoryState, id: &str) -> Result<(), RemoteError> {
    if state.offline {
        return Err(RemoteError::Transient("remote offline".into()));
    }
    if state.denied.contains(id) {
        return Err(RemoteError::Unauthorized(id.to_string()));
    }
    Ok(())
}

#[async_trait]
impl RemoteStore for InMemoryRemote {
    async fn get(&self, id: &str) -> Result<RemoteDocument, RemoteError> {
        let state = self.inner.read().await;
        check(&state, id)?;
        state
            .docs
            .get(id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))
    }

    async fn put(&self, doc: RemoteDocument) -> Result<(), RemoteError> {
        let mut state = self.inner.write().await;
        check(&state, &doc.id)?;
        state.docs.insert(doc.id.clone(), doc);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        let mut state = self.inner.write().await;
        check(&state, id)?;
        state.docs.remove(id);
        Ok(())
    }

    async fn list(&self, owner_id: &str) -> Result<Vec<RemoteDocument>, RemoteError> {
        let state = self.inner.read().await;
        if state.offline {
            return Err(RemoteError::Transient("remote offline".into()));
        }
        Ok(state
            .docs
            .values()
            .filter(|d| d.owner_id == owner_id && !state.denied.contains(&d.id))
            .cloned()
            .collect())
    }
}
