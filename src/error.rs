use thiserror::Error;

use crate::schema::RecordKind;

/// Batch-level failures surfaced to the caller. Cell-level conversion issues
/// never reach this type; they degrade to absent values during normalization.
/// Either variant means the batch was rejected wholesale and nothing was
/// written.
#[derive(Debug, Error)]
pub enum IngestError {
    /// None of the batch's columns matched the record kind's accepted labels.
    #[error("no recognized {kind} column found in the batch")]
    SchemaMismatch { kind: RecordKind },
    /// The destination store rejected the batch.
    #[error("failed to write {kind} batch to the database")]
    Persistence {
        kind: RecordKind,
        #[source]
        source: rusqlite::Error,
    },
}
