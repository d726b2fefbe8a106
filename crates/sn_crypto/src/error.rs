use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    /// Wrong password or corrupted ciphertext — deliberately one variant.
    /// The AEAD tag check is the only signal and it cannot tell the two apart.
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("AEAD encryption failed")]
    Encrypt,

    /// The OS randomness source failed. Aborts the encryption attempt;
    /// never proceed with predictable salt or nonce values.
    #[error("randomness source unavailable: {0}")]
    Rng(String),

    #[error("background crypto task failed: {0}")]
    Task(String),
}
