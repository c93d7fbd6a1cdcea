//! Configuration for the command-backed collaborators.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// External program that performs provider operations.
///
/// Each operation runs `<program> <args..> <operation> [feature]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    #[serde(default = "default_program")]
    pub program: String,

    /// Arguments placed before the operation name.
    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory for the program (defaults to the process cwd).
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

fn default_program() -> String {
    "gamekit-provider".to_string()
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: Vec::new(),
            working_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal() {
        let config: CommandConfig = toml::from_str("").unwrap();
        assert_eq!(config.program, "gamekit-provider");
        assert!(config.args.is_empty());
        assert!(config.working_dir.is_none());
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
            program = "python3"
            args = ["tools/provider.py", "--profile", "dev"]
            working_dir = "/srv/gamekit"
        "#;
        let config: CommandConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.program, "python3");
        assert_eq!(config.args.len(), 3);
        assert_eq!(config.working_dir, Some(PathBuf::from("/srv/gamekit")));
    }
}
