//! Error type for collaborator calls.

use thiserror::Error;

use crate::result_code::ResultCode;

/// A collaborator call failed with a specific result code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({code})")]
pub struct ProviderError {
    pub code: ResultCode,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: ResultCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> ResultCode {
        self.code
    }
}
