//! Authenticated encryption.
//!
//! AES-256-GCM: 32-byte key, 12-byte nonce (random, never reused under the
//! same key), 16-byte tag appended to the ciphertext by the cipher.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::kdf::ContentKey;

pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// Fresh random nonce — one per encryption operation.
pub fn generate_nonce() -> Result<[u8; NONCE_LEN], CryptoError> {
    let mut nonce = [0u8; NONCE_LEN];
    rand::rngs::OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|e| CryptoError::Rng(e.to_string()))?;
    Ok(nonce)
}

/// Encrypt `plaintext` under `key` with the given nonce.
pub fn seal(
    key: &ContentKey,
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CryptoError::Encrypt)?;
    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| CryptoError::Encrypt)
}

/// Decrypt ciphertext+tag produced by `seal`.
///
/// The tag check is the cipher's constant-time comparison. No further
/// inspection of the plaintext happens here, so a wrong key and a
/// tampered ciphertext fail identically.
pub fn open(
    key: &ContentKey,
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CryptoError::AuthenticationFailed)?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::AuthenticationFailed)?;
    Ok(Zeroizing::new(plaintext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdf::{derive_key, KdfScheme, SALT_LEN};

    fn test_key(password: &[u8]) -> ContentKey {
        derive_key(password, &[9u8; SALT_LEN], KdfScheme::V1)
    }

    #[test]
    fn seal_open_round_trip() {
        let key = test_key(b"pw");
        let nonce = [3u8; NONCE_LEN];
        let ct = seal(&key, &nonce, b"payload").unwrap();
        assert_eq!(ct.len(), b"payload".len() + TAG_LEN);
        let pt = open(&key, &nonce, &ct).unwrap();
        assert_eq!(&pt[..], b"payload");
    }

    #[test]
    fn wrong_key_fails_closed() {
        let nonce = [3u8; NONCE_LEN];
        let ct = seal(&test_key(b"pw"), &nonce, b"payload").unwrap();
        let err = open(&test_key(b"other"), &nonce, &ct).unwrap_err();
        assert!(matches!(err, CryptoError::AuthenticationFailed));
    }
}
