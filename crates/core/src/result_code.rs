//! Numeric result codes shared with collaborators and callers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A numeric status code. `0` is success; every other value names a failure.
///
/// Collaborator failures carry their own code, which the orchestrator passes
/// through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultCode(pub u32);

impl ResultCode {
    pub const SUCCESS: ResultCode = ResultCode(0x0);
    pub const CLOUDFORMATION_FILE_SAVE_FAILED: ResultCode = ResultCode(0x4);
    pub const FUNCTIONS_COPY_FAILED: ResultCode = ResultCode(0x10);
    pub const GENERAL: ResultCode = ResultCode(0x15F);
    pub const REGION_CODE_CONVERSION_FAILED: ResultCode = ResultCode(0x160);
    pub const CLOUDFORMATION_STACK_CREATION_FAILED: ResultCode = ResultCode(0x3F0);
    pub const CLOUDFORMATION_STACK_UPDATE_FAILED: ResultCode = ResultCode(0x3F1);
    pub const CLOUDFORMATION_STACK_DELETE_FAILED: ResultCode = ResultCode(0x3F3);
    pub const CLOUDFORMATION_DESCRIBE_RESOURCE_FAILED: ResultCode = ResultCode(0x3F4);
    pub const CLOUDFORMATION_DESCRIBE_STACKS_FAILED: ResultCode = ResultCode(0x3F5);
    pub const APIGATEWAY_STAGE_DEPLOYMENT_FAILED: ResultCode = ResultCode(0x3F7);
    pub const LAYER_CREATION_FAILED: ResultCode = ResultCode(0x3FB);
    pub const ORCHESTRATION_INVALID_FEATURE_STATE: ResultCode = ResultCode(0x5DD);
    pub const ORCHESTRATION_INVALID_FEATURE_SETTINGS: ResultCode = ResultCode(0x5DE);
    pub const ORCHESTRATION_DEPLOYMENT_IN_PROGRESS: ResultCode = ResultCode(0x5DF);

    pub fn is_success(&self) -> bool {
        *self == Self::SUCCESS
    }

    /// Parse `0x5DD`, `0X5dd` or plain decimal.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => s.parse::<u32>().ok(),
        };
        parsed.map(ResultCode)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#X}", self.0)
    }
}

impl From<u32> for ResultCode {
    fn from(value: u32) -> Self {
        ResultCode(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(
            ResultCode::parse("0x5DD"),
            Some(ResultCode::ORCHESTRATION_INVALID_FEATURE_STATE)
        );
        assert_eq!(ResultCode::parse("0x3f0"), Some(ResultCode(0x3F0)));
        assert_eq!(ResultCode::parse(" 16 "), Some(ResultCode::FUNCTIONS_COPY_FAILED));
        assert_eq!(ResultCode::parse("nope"), None);
    }

    #[test]
    fn test_success() {
        assert!(ResultCode::SUCCESS.is_success());
        assert!(!ResultCode::GENERAL.is_success());
    }
}
