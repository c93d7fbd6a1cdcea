use std::collections::BTreeMap;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::account::{AccountCredentials, AccountInfo, RegionError, RegionMappings};
use crate::orchestrator::OrchestratorConfig;
use crate::provider::CommandConfig;
use crate::settings::FeatureSettings;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    /// Extra or replacement five-letter region codes.
    #[serde(default)]
    pub regions: BTreeMap<String, String>,
    #[serde(default)]
    pub commands: CommandConfig,
    /// Per-feature settings variables.
    #[serde(default)]
    pub features: FeatureSettings,
    /// Account applied at startup.
    #[serde(default)]
    pub account: Option<AccountConfig>,
}

impl Config {
    /// Built-in region table with `[regions]` merged over it.
    pub fn region_mappings(&self) -> Result<RegionMappings, RegionError> {
        RegionMappings::with_overrides(&self.regions)
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// When set, API requests must present this key.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_key: None,
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Account info and credentials in one table.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AccountConfig {
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub game_name: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub access_secret: String,
}

impl AccountConfig {
    pub fn info(&self) -> AccountInfo {
        AccountInfo {
            environment: self.environment.clone(),
            account_id: self.account_id.clone(),
            company_name: self.company_name.clone(),
            game_name: self.game_name.clone(),
        }
    }

    pub fn credentials(&self) -> AccountCredentials {
        AccountCredentials {
            region: self.region.clone(),
            access_key: self.access_key.clone(),
            access_secret: self.access_secret.clone(),
            account_id: self.account_id.clone(),
        }
    }
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: SanitizedServerConfig,
    pub orchestrator: OrchestratorConfig,
    pub regions: BTreeMap<String, String>,
    pub commands: CommandConfig,
    pub features: FeatureSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<SanitizedAccountConfig>,
}

/// Server config with the API key hidden
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub api_key_configured: bool,
}

/// Account config with credentials hidden
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAccountConfig {
    pub environment: String,
    pub company_name: String,
    pub game_name: String,
    pub region: String,
    pub credentials_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: SanitizedServerConfig {
                host: config.server.host,
                port: config.server.port,
                api_key_configured: config
                    .server
                    .api_key
                    .as_ref()
                    .is_some_and(|k| !k.is_empty()),
            },
            orchestrator: config.orchestrator.clone(),
            regions: config.regions.clone(),
            commands: config.commands.clone(),
            features: config.features.clone(),
            account: config.account.as_ref().map(|a| SanitizedAccountConfig {
                environment: a.environment.clone(),
                company_name: a.company_name.clone(),
                game_name: a.game_name.clone(),
                region: a.region.clone(),
                credentials_configured: !a.access_key.is_empty() && !a.access_secret.is_empty(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::FeatureType;

    #[test]
    fn test_deserialize_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert!(config.server.api_key.is_none());
        assert!(config.account.is_none());
        assert!(config.regions.is_empty());
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000
api_key = "secret-key"

[orchestrator]
base_templates_folder = "/opt/gamekit/templates"
source_engine = "UNITY"

[regions]
il-central-1 = "ilce1"

[commands]
program = "gamekit-aws"
args = ["--verbose"]

[features.identity]
is_facebook_enabled = "false"

[account]
environment = "dev"
account_id = "123456789012"
game_name = "mygame"
region = "us-west-2"
access_key = "AKIA"
access_secret = "shh"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.orchestrator.source_engine, "UNITY");
        assert_eq!(config.commands.program, "gamekit-aws");
        assert_eq!(
            config
                .features
                .variable(FeatureType::Identity, "is_facebook_enabled"),
            Some("false")
        );
        assert_eq!(
            config
                .region_mappings()
                .unwrap()
                .five_letter_code("il-central-1")
                .unwrap(),
            "ilce1"
        );

        let account = config.account.as_ref().unwrap();
        assert_eq!(account.info().game_name, "mygame");
        assert_eq!(account.credentials().region, "us-west-2");
    }

    #[test]
    fn test_sanitized_config_hides_secrets() {
        let config = Config {
            server: ServerConfig {
                api_key: Some("secret-key".to_string()),
                ..ServerConfig::default()
            },
            account: Some(AccountConfig {
                game_name: "mygame".to_string(),
                access_key: "AKIA".to_string(),
                access_secret: "shh".to_string(),
                ..AccountConfig::default()
            }),
            ..Config::default()
        };

        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.server.api_key_configured);
        assert!(sanitized.account.as_ref().unwrap().credentials_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret-key"));
        assert!(!json.contains("shh"));
    }
}
