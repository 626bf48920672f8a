use thiserror::Error;

/// Store failures. None of these ever imply a successful write.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend unreachable (pool closed, IO, poisoned lock).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Referential or check constraint rejected the write.
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// A persisted row could not be turned back into a domain value.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("store error: {0}")]
    Backend(String),
}
