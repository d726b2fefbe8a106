use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(sqlx::Error),

    /// The storage medium rejected the write. The note was not persisted;
    /// no partial write is observable.
    #[error("storage quota exceeded — free space and retry")]
    QuotaExceeded,

    #[error("record not found: {0}")]
    NotFound(String),

    /// `put` may not change the owner of an existing note.
    #[error("ownership violation for note {id}: stored owner {stored}, attempted {attempted}")]
    OwnershipViolation {
        id: String,
        stored: String,
        attempted: String,
    },

    /// Restore attempted after the retention window elapsed.
    #[error("retention window elapsed for note {0}")]
    RetentionExpired(String),

    #[error("serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),

    #[error("migration error: {0}")]
    Migration(String),

    #[error("invalid record: {0}")]
    Record(#[from] sn_proto::ProtoError),
}

// SQLITE_FULL (result code 13) becomes the caller-facing quota error;
// every other driver failure stays a database error.
impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if matches!(db.code().as_deref(), Some("13") | Some("SQLITE_FULL")) {
                return StoreError::QuotaExceeded;
            }
        }
        StoreError::Database(e)
    }
}
