//! Resources of a deployed feature stack.

use serde::{Deserialize, Serialize};

use super::error::ProviderError;
use crate::result_code::ResultCode;

/// One resource of a feature's stack, as the provider reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackResource {
    pub logical_resource_id: String,
    pub resource_type: String,
    pub resource_status: String,
}

impl StackResource {
    pub fn new(
        logical_resource_id: impl Into<String>,
        resource_type: impl Into<String>,
        resource_status: impl Into<String>,
    ) -> Self {
        Self {
            logical_resource_id: logical_resource_id.into(),
            resource_type: resource_type.into(),
            resource_status: resource_status.into(),
        }
    }
}

/// Parse a resource listing: one `<logical id> <type> <status>` per line,
/// whitespace separated. Blank lines are skipped.
pub fn parse_stack_resources(listing: &str) -> Result<Vec<StackResource>, ProviderError> {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [id, kind, status] => Ok(StackResource::new(*id, *kind, *status)),
                _ => Err(ProviderError::new(
                    ResultCode::CLOUDFORMATION_DESCRIBE_RESOURCE_FAILED,
                    format!("malformed resource line: {:?}", line),
                )),
            }
        })
        .collect()
}
