use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load the deployment service configuration.
///
/// The TOML file is read first, then `GAMEKIT_` environment variables
/// override it. Nested keys use a double underscore, so
/// `GAMEKIT_ACCOUNT__REGION=eu-west-1` sets `account.region`.
/// `GAMEKIT_CONFIG` names the file itself and is never read as a key.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("GAMEKIT_").ignore(&["CONFIG"]).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from a TOML string, without environment overrides.
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::FeatureType;
    use figment::Jail;

    const DEPLOYMENT_TOML: &str = r#"
[server]
host = "127.0.0.1"
port = 3000

[commands]
program = "/usr/local/bin/gamekit-provider"
args = ["--profile", "dev"]

[orchestrator.dependencies]
main = []
identity = ["main"]
achievements = ["main", "identity"]
gamesaving = ["main"]
usergamedata = ["main"]

[account]
environment = "dev"
account_id = "123456789012"
company_name = "Studio"
game_name = "Skyfall"
region = "us-west-2"
access_key = "AKIA"
access_secret = "secret"
"#;

    #[test]
    fn test_load_config_from_str_deployment() {
        let config = load_config_from_str(DEPLOYMENT_TOML).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.commands.args, vec!["--profile", "dev"]);

        let graph = config.orchestrator.dependency_graph().unwrap();
        assert!(graph
            .upstream_of(FeatureType::GameStateCloudSaving)
            .iter()
            .all(|f| *f == FeatureType::Main));

        let account = config.account.unwrap();
        assert_eq!(account.game_name, "Skyfall");
        assert_eq!(account.region, "us-west-2");
    }

    #[test]
    fn test_load_config_from_str_unknown_feature() {
        let toml = r#"
[orchestrator.dependencies]
leaderboards = ["main"]
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let err = load_config(Path::new("/nonexistent/gamekit.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("gamekit.toml", DEPLOYMENT_TOML)?;
            jail.set_env("GAMEKIT_SERVER__PORT", "9100");
            jail.set_env("GAMEKIT_ACCOUNT__REGION", "eu-west-1");
            jail.set_env("GAMEKIT_CONFIG", "elsewhere.toml");

            let config = load_config(Path::new("gamekit.toml")).map_err(|e| e.to_string())?;
            assert_eq!(config.server.port, 9100);
            assert_eq!(config.commands.program, "/usr/local/bin/gamekit-provider");

            let account = config.account.ok_or("account missing")?;
            assert_eq!(account.region, "eu-west-1");
            assert_eq!(account.game_name, "Skyfall");
            Ok(())
        });
    }
}
