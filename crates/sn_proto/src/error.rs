use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtoError {
    /// Token cannot be an envelope: bad alphabet, truncated, or an
    /// unrecognised scheme version. Not retried — surfaced to the caller.
    #[error("malformed envelope token: {0}")]
    MalformedEnvelope(String),

    #[error("invalid note id: {0}")]
    InvalidNoteId(String),

    /// A record constructor was asked to violate a creation-time
    /// invariant (e.g. plaintext fields on an encrypted note).
    #[error("invalid note record: {0}")]
    InvalidNote(String),

    #[error("randomness source unavailable: {0}")]
    Rng(String),
}
