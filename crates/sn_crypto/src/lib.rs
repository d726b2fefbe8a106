//! sn_crypto — password envelope encryption for Sealnote
//!
//! # Design principles
//! - NO custom crypto; all primitives come from audited Rust crates.
//! - Zeroize all secret material on drop.
//! - One error path for decryption: a wrong password and a corrupted
//!   ciphertext are indistinguishable to the caller.
//!
//! # Scheme (v1)
//! - Key derivation: PBKDF2-HMAC-SHA256, 600 000 iterations, 32-byte key.
//! - Cipher: AES-256-GCM, 12-byte random nonce, 16-byte tag.
//!
//! The derivation scheme is versioned and the version byte travels with
//! every envelope, so future parameter bumps keep old ciphertext readable.
//! Salt and nonce live inside the envelope: a ciphertext is decryptable
//! given only the password, with no note metadata attached. That is what
//! makes share links self-contained.
//!
//! # Module layout
//! - `kdf`      — versioned password key derivation
//! - `aead`     — AES-256-GCM seal/open helpers
//! - `envelope` — the `Envelope` type + `encrypt`/`decrypt` composition
//! - `task`     — `spawn_blocking` wrappers for latency-sensitive callers
//! - `error`    — unified error type

pub mod aead;
pub mod envelope;
pub mod error;
pub mod kdf;
pub mod task;

pub use aead::{NONCE_LEN, TAG_LEN};
pub use envelope::{decrypt, encrypt, Envelope};
pub use error::CryptoError;
pub use kdf::{ContentKey, KdfScheme, KEY_LEN, SALT_LEN};
