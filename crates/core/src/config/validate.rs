use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Provider command program is set
/// - Dependency table (when given) forms a valid graph
/// - Region codes are five lowercase alphanumerics
/// - Startup account region (when given) resolves to a region code
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.commands.program.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "commands.program cannot be empty".to_string(),
        ));
    }

    config
        .orchestrator
        .dependency_graph()
        .map_err(|e| ConfigError::ValidationError(format!("orchestrator.dependencies: {}", e)))?;

    let regions = config
        .region_mappings()
        .map_err(|e| ConfigError::ValidationError(format!("regions: {}", e)))?;

    if let Some(account) = &config.account {
        if !account.region.is_empty() {
            regions
                .five_letter_code(&account.region)
                .map_err(|e| ConfigError::ValidationError(format!("account.region: {}", e)))?;
        }
    }

    Ok(())
}
