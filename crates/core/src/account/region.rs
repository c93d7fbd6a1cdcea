//! Full region name to five-letter region code mapping.

use std::collections::BTreeMap;

use thiserror::Error;

/// Built-in five-letter codes.
const BUILTIN_REGION_CODES: &[(&str, &str)] = &[
    ("us-east-1", "usea1"),
    ("us-east-2", "usea2"),
    ("us-west-1", "uswe1"),
    ("us-west-2", "uswe2"),
    ("af-south-1", "afso1"),
    ("ap-east-1", "apea1"),
    ("ap-south-1", "apso1"),
    ("ap-northeast-1", "apne1"),
    ("ap-northeast-2", "apne2"),
    ("ap-northeast-3", "apne3"),
    ("ap-southeast-1", "apse1"),
    ("ap-southeast-2", "apse2"),
    ("ca-central-1", "cace1"),
    ("eu-central-1", "euce1"),
    ("eu-west-1", "euwe1"),
    ("eu-west-2", "euwe2"),
    ("eu-west-3", "euwe3"),
    ("eu-south-1", "euso1"),
    ("eu-north-1", "euno1"),
    ("me-south-1", "meso1"),
    ("sa-east-1", "saea1"),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegionError {
    #[error("no five-letter region code known for region {0:?}")]
    UnknownRegion(String),

    #[error("region code {code:?} for {region} must be exactly five lowercase alphanumerics")]
    InvalidCode { region: String, code: String },
}

/// Lookup table from region names (`us-west-2`) to short codes (`uswe2`).
#[derive(Debug, Clone)]
pub struct RegionMappings {
    codes: BTreeMap<String, String>,
}

impl RegionMappings {
    /// The built-in table.
    pub fn builtin() -> Self {
        Self {
            codes: BUILTIN_REGION_CODES
                .iter()
                .map(|(region, code)| (region.to_string(), code.to_string()))
                .collect(),
        }
    }

    /// The built-in table with `extra` merged over it.
    pub fn with_overrides(extra: &BTreeMap<String, String>) -> Result<Self, RegionError> {
        let mut mappings = Self::builtin();
        for (region, code) in extra {
            if !is_valid_short_code(code) {
                return Err(RegionError::InvalidCode {
                    region: region.clone(),
                    code: code.clone(),
                });
            }
            mappings.codes.insert(region.clone(), code.clone());
        }
        Ok(mappings)
    }

    pub fn five_letter_code(&self, region: &str) -> Result<&str, RegionError> {
        self.codes
            .get(region)
            .map(String::as_str)
            .ok_or_else(|| RegionError::UnknownRegion(region.to_string()))
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl Default for RegionMappings {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Exactly five ASCII lowercase letters or digits.
pub fn is_valid_short_code(code: &str) -> bool {
    code.len() == 5
        && code
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}
