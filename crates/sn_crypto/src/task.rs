//! Off-thread wrappers for the expensive derivation path.
//!
//! A single PBKDF2 derivation takes hundreds of milliseconds, so callers
//! on a latency-sensitive task (the editor's save path, a drain loop)
//! should go through these instead of calling `encrypt`/`decrypt` inline.

use zeroize::Zeroizing;

use crate::envelope::{self, Envelope};
use crate::error::CryptoError;

/// `envelope::encrypt` on the blocking thread pool.
pub async fn encrypt_detached(plaintext: Vec<u8>, password: Vec<u8>) -> Result<Envelope, CryptoError> {
    let plaintext = Zeroizing::new(plaintext);
    let password = Zeroizing::new(password);
    tokio::task::spawn_blocking(move || envelope::encrypt(&plaintext, &password))
        .await
        .map_err(|e| CryptoError::Task(e.to_string()))?
}

/// `envelope::decrypt` on the blocking thread pool.
pub async fn decrypt_detached(
    envelope: Envelope,
    password: Vec<u8>,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let password = Zeroizing::new(password);
    tokio::task::spawn_blocking(move || envelope::decrypt(&envelope, &password))
        .await
        .map_err(|e| CryptoError::Task(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn detached_round_trip() {
        let env = encrypt_detached(b"async hello".to_vec(), b"pw".to_vec())
            .await
            .unwrap();
        let pt = decrypt_detached(env, b"pw".to_vec()).await.unwrap();
        assert_eq!(&pt[..], b"async hello");
    }
}
