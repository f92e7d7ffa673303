use crate::TermId;
use std::path::PathBuf;

/// Why a sparse vector was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidVector {
    #[error("indices and values differ in length ({indices} vs {values})")]
    LengthMismatch { indices: usize, values: usize },
    #[error("term {term_id} is out of range for dimension {dim}")]
    TermOutOfRange { term_id: TermId, dim: usize },
    #[error("term {0} appears more than once")]
    DuplicateTerm(TermId),
    #[error("term {term_id} has negative value {value}")]
    NegativeValue { term_id: TermId, value: f32 },
    #[error("term {term_id} has non-finite value")]
    NonFiniteValue { term_id: TermId },
    #[error("entries are unsorted or hold zero values")]
    NotCanonical,
    #[error("vector dimension {found} does not match index dimension {expected}")]
    DimensionMismatch { expected: usize, found: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("invalid vector: {0}")]
    InvalidVector(#[from] InvalidVector),
    /// A persisted blob is missing, corrupt or does not fit the current vocabulary.
    #[error("cannot restore {}: {reason}", path.display())]
    Serialization { path: PathBuf, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("document store: {0}")]
    Store(#[from] sled::Error),
    #[error("document encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl IndexError {
    pub(crate) fn serialization(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        IndexError::Serialization { path: path.into(), reason: reason.to_string() }
    }
}

/// Non-fatal conditions surfaced to the caller instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IndexWarning {
    #[error("no documents are indexed")]
    EmptyIndex,
}

pub type Result<T, E = IndexError> = std::result::Result<T, E>;
