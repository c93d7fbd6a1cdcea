//! Account identity and credential types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which game/environment the deployment targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub game_name: String,
}

/// Provider credentials as supplied by the caller.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AccountCredentials {
    pub region: String,
    pub access_key: String,
    pub access_secret: String,
    /// Falls back to `AccountInfo::account_id` when empty.
    #[serde(default)]
    pub account_id: String,
}

impl fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountCredentials")
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("access_secret", &"<redacted>")
            .field("account_id", &self.account_id)
            .finish()
    }
}

/// Everything collaborators need to act on behalf of one account.
///
/// Built by `set_credentials` once the region resolved to a short code.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AccountSession {
    pub info: AccountInfo,
    pub account_id: String,
    pub region: String,
    pub short_region_code: String,
    pub access_key: String,
    pub access_secret: String,
}

impl AccountSession {
    pub fn new(info: AccountInfo, credentials: AccountCredentials, short_region_code: &str) -> Self {
        let account_id = if credentials.account_id.is_empty() {
            info.account_id.clone()
        } else {
            credentials.account_id
        };
        Self {
            info,
            account_id,
            region: credentials.region,
            short_region_code: short_region_code.to_string(),
            access_key: credentials.access_key,
            access_secret: credentials.access_secret,
        }
    }

    /// Every field collaborators rely on is present.
    pub fn is_complete(&self) -> bool {
        !self.account_id.is_empty()
            && !self.info.game_name.is_empty()
            && !self.access_key.is_empty()
            && !self.access_secret.is_empty()
            && !self.region.is_empty()
            && !self.short_region_code.is_empty()
    }
}

impl fmt::Debug for AccountSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountSession")
            .field("info", &self.info)
            .field("account_id", &self.account_id)
            .field("region", &self.region)
            .field("short_region_code", &self.short_region_code)
            .field("access_key", &self.access_key)
            .field("access_secret", &"<redacted>")
            .finish()
    }
}
