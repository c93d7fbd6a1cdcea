//! Account identity, credentials and region codes.

mod region;
mod types;

pub use region::{is_valid_short_code, RegionError, RegionMappings};
pub use types::{AccountCredentials, AccountInfo, AccountSession};
