//! sn_proto — note records, envelope codec, and share links for Sealnote
//!
//! The portable text form of an envelope is versioned so future derivation
//! schemes can coexist with existing tokens; see `codec` for the layout.
//!
//! # Module layout
//! - `note`      — the `Note` record and its creation-time invariants
//! - `codec`     — pack/unpack between `Envelope` and the URL-safe token
//! - `sharelink` — envelope transport by value in a URL fragment
//! - `error`     — unified error type

pub mod codec;
pub mod error;
pub mod note;
pub mod sharelink;

pub use codec::{pack, unpack};
pub use error::ProtoError;
pub use note::{Note, NoteId};
