//! sn_store — durable local note store for Sealnote
//!
//! # Storage strategy
//! SQLite via sqlx, WAL journal mode. The store is the authoritative set
//! of notes on a device; encrypted notes keep their ciphertext in the
//! `data` column as a packed envelope token, so nothing sensitive touches
//! disk in the clear unless the user chose a plaintext note.
//!
//! Deletion is soft: `soft_delete` stamps `deleted_at`, `restore` clears
//! it within the retention window, and `purge_expired` is the only
//! operation that removes rows irreversibly.
//!
//! The outbound sync queue is persisted here too (one table, last-write
//! coalescing per note id) so queued mutations survive restarts; the sync
//! engine owns its semantics.
//!
//! # Migration
//! sqlx migrations in `migrations/` are run on open.

pub mod db;
pub mod error;
pub mod models;
pub mod notes;
pub mod queue;
pub mod settings;

pub use db::Store;
pub use error::StoreError;
pub use queue::{Mutation, MutationKind, QueueEntry};
pub use settings::RetentionSettings;
