use thiserror::Error;

/// Failures at the edges of the crate (decoding, typed snapshots).
/// Reducer transitions themselves never fail.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("expected a mapping at the state root, found {found}")]
    NotAMapping { found: &'static str },

    #[error("action is missing its `{0}` field")]
    MissingField(&'static str),

    #[error("action field `{field}` must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    #[cfg(feature = "serde")]
    #[error("snapshot conversion failed: {0}")]
    Snapshot(#[from] serde_json::Error),
}

pub type StateResult<T> = Result<T, StateError>;
