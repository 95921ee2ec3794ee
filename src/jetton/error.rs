use crate::tvm::{ErrorKind, TvmError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JettonError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Format error: {0}")]
    Format(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error(transparent)]
    Tvm(#[from] TvmError),
}

impl JettonError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            JettonError::Validation(_) => ErrorKind::Validation,
            JettonError::Format(_) => ErrorKind::Format,
            JettonError::Decode(_) => ErrorKind::Decode,
            JettonError::Tvm(e) => e.kind(),
        }
    }
}

pub type JettonResult<T> = Result<T, JettonError>;
