//! Password envelopes.
//!
//! One envelope = one encryption operation. `encrypt` draws a fresh salt
//! and nonce every call, so re-encrypting the same plaintext under the
//! same password yields a different envelope — required, not incidental.
//! An envelope is immutable once produced.

use zeroize::Zeroizing;

use crate::aead::{self, NONCE_LEN};
use crate::error::CryptoError;
use crate::kdf::{self, KdfScheme, SALT_LEN};

/// Self-contained authenticated ciphertext: everything needed to decrypt
/// (except the password) travels inside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Derivation scheme that produced the key for this envelope.
    pub scheme: KdfScheme,
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_LEN],
    /// Ciphertext with the 16-byte GCM tag appended.
    pub ciphertext: Vec<u8>,
}

/// Encrypt `plaintext` under `password` into a fresh envelope.
///
/// Fails only if the OS randomness source does, in which case the attempt
/// is aborted outright.
pub fn encrypt(plaintext: &[u8], password: &[u8]) -> Result<Envelope, CryptoError> {
    let scheme = KdfScheme::CURRENT;
    let salt = kdf::generate_salt()?;
    let nonce = aead::generate_nonce()?;
    let key = kdf::derive_key(password, &salt, scheme);
    let ciphertext = aead::seal(&key, &nonce, plaintext)?;
    Ok(Envelope {
        scheme,
        salt,
        nonce,
        ciphertext,
    })
}

/// Decrypt an envelope with `password`.
///
/// Either returns the full plaintext or fails with
/// `CryptoError::AuthenticationFailed` — no partial plaintext, and no
/// distinction between a wrong password and corrupted data.
pub fn decrypt(envelope: &Envelope, password: &[u8]) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let key = kdf::derive_key(password, &envelope.salt, envelope.scheme);
    aead::open(&key, &envelope.nonce, &envelope.ciphertext)
}
