use thiserror::Error;

use crate::remote::RemoteError;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("store error: {0}")]
    Store(#[from] sn_store::StoreError),

    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// A pulled document's owner differs from the local record's. Never
    /// applied — surfaced and the merge aborted with no state change.
    #[error("ownership conflict for note {id}: local owner {local}, remote owner {remote}")]
    ConflictViolation {
        id: String,
        local: String,
        remote: String,
    },

    #[error("invalid record: {0}")]
    Record(#[from] sn_proto::ProtoError),
}
