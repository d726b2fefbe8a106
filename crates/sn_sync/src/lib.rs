//! sn_sync — offline-first synchronization for Sealnote
//!
//! Makes the local store and an optional remote document service
//! eventually consistent for every non-private note, without ever
//! blocking a local write on remote availability.
//!
//! # Model
//! Every local write to a syncable note appends to a persisted outbound
//! queue (one coalesced entry per note id). A drain pass pushes queued
//! mutations under last-writer-wins by `updated_at`:
//!
//! - remote strictly newer → the remote copy is pulled and merged locally
//!   (remote wins);
//! - remote strictly older or absent → the local state is applied
//!   remotely (local wins);
//! - equal → already consistent, no-op.
//!
//! The same rule, in reverse, guards pulls, which makes the merge
//! commutative and idempotent — a queue may be drained any number of
//! times after reconnection. Ownership is re-checked on every merge.
//!
//! Transient network failures leave entries queued for the next pass;
//! cancellation between remote calls stops the loop with unacknowledged
//! entries intact.
//!
//! # Module layout
//! - `remote`   — the `RemoteStore` boundary + `InMemoryRemote`
//! - `engine`   — `SyncEngine`: write paths, drain, pull, purge, run loop
//! - `settings` — drain cadence configuration
//! - `error`    — unified error type

pub mod engine;
pub mod error;
pub mod remote;
pub mod settings;

pub use engine::{DrainReport, PullReport, SyncEngine};
pub use error::SyncError;
pub use remote::{InMemoryRemote, RemoteDocument, RemoteError, RemoteStore};
pub use settings::SyncSettings;
