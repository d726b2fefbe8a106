//! Versioned password key derivation.
//!
//! `derive_key` — PBKDF2-HMAC-SHA256, derives the 32-byte content key for
//! one envelope from a password and the envelope's own salt.
//!
//! The iteration count is part of the scheme contract: every envelope
//! records which scheme produced it, so the count can be raised in a
//! future scheme without orphaning existing ciphertext.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use zeroize::ZeroizeOnDrop;

use crate::error::CryptoError;

pub const SALT_LEN: usize = 16;
pub const KEY_LEN: usize = 32;

/// Derivation scheme identifier. The version byte leads every packed
/// envelope; unknown bytes are rejected at unpack time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KdfScheme {
    /// PBKDF2-HMAC-SHA256, 600 000 iterations.
    V1,
}

impl KdfScheme {
    /// Scheme used for all newly produced envelopes.
    pub const CURRENT: KdfScheme = KdfScheme::V1;

    pub const fn version_byte(self) -> u8 {
        match self {
            KdfScheme::V1 => 1,
        }
    }

    pub fn from_version_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(KdfScheme::V1),
            _ => None,
        }
    }

    pub const fn iterations(self) -> u32 {
        match self {
            KdfScheme::V1 => 600_000,
        }
    }
}

/// 32-byte content key derived from a password. Zeroized on drop.
#[derive(ZeroizeOnDrop)]
pub struct ContentKey([u8; KEY_LEN]);

impl ContentKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

/// Derive the content key for one envelope. Deliberately expensive
/// (~hundreds of milliseconds); see `task` for off-thread wrappers.
pub fn derive_key(password: &[u8], salt: &[u8; SALT_LEN], scheme: KdfScheme) -> ContentKey {
    let mut out = [0u8; KEY_LEN];
    match scheme {
        KdfScheme::V1 => pbkdf2_hmac::<Sha256>(password, salt, scheme.iterations(), &mut out),
    }
    ContentKey(out)
}

/// Fresh random salt — one per encryption operation, stored in the
/// envelope (not secret).
pub fn generate_salt() -> Result<[u8; SALT_LEN], CryptoError> {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| CryptoError::Rng(e.to_string()))?;
    Ok(salt)
}
