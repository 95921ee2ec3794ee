use thiserror::Error;

/// Broad failure classes shared by every error type in the crate.
///
/// None of them is transient: each one points at a defect in the input or
/// in the calling code, so nothing here is ever retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input rejected before anything was produced.
    Validation,
    /// Encoded data does not follow the expected layout.
    Format,
    /// A result stack is too short or holds the wrong item type.
    Decode,
    /// A cursor ran out of bits or references.
    Underflow,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TvmError {
    #[error("Cell overflow: {0}")]
    Overflow(String),
    #[error("Cell underflow: requested {requested} {unit}, {available} remaining")]
    Underflow {
        unit: &'static str,
        requested: usize,
        available: usize,
    },
    #[error("Invalid format: {0}")]
    Format(String),
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    #[error("Stack decode error at index {index}: {reason}")]
    StackDecode { index: usize, reason: String },
}

impl TvmError {
    pub(crate) fn bits_underflow(requested: usize, available: usize) -> Self {
        TvmError::Underflow {
            unit: "bits",
            requested,
            available,
        }
    }

    pub(crate) fn refs_underflow(requested: usize, available: usize) -> Self {
        TvmError::Underflow {
            unit: "refs",
            requested,
            available,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TvmError::Overflow(_) | TvmError::InvalidValue(_) => ErrorKind::Validation,
            TvmError::Underflow { .. } => ErrorKind::Underflow,
            TvmError::Format(_) => ErrorKind::Format,
            TvmError::StackDecode { .. } => ErrorKind::Decode,
        }
    }
}

pub type TvmResult<T> = Result<T, TvmError>;
