use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RigupError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Target interpreter version, `major.minor.patch`.
    #[serde(default = "default_python_version")]
    pub python_version: String,

    /// Where the version manager keeps its tree. Defaults to `~/.pyenv`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pyenv_root: Option<String>,

    /// Path of the Docker Desktop application bundle.
    #[serde(default = "default_docker_app")]
    pub docker_app: String,
}

fn default_python_version() -> String {
    "3.11.0".to_string()
}

fn default_docker_app() -> String {
    "/Applications/Docker.app".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            python_version: default_python_version(),
            pyenv_root: None,
            docker_app: default_docker_app(),
        }
    }
}

impl AppConfig {
    pub fn config_dir() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| RigupError::Config("HOME environment variable not set".to_string()))?;
        Ok(PathBuf::from(home).join(".config").join("rigup"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.yaml"))
    }

    /// Load the config file, falling back to defaults when it does not
    /// exist. Environment variables override file values either way.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_yaml::from_str(&content)
                .map_err(|e| RigupError::Config(format!("Invalid config: {}", e)))?
        } else {
            Self::default()
        };

        if let Ok(version) = std::env::var("RIGUP_PYTHON_VERSION") {
            if !version.is_empty() {
                config.python_version = version;
            }
        }

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| RigupError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(&path, perms)?;
        }

        Ok(())
    }

    /// Resolved pyenv root: the configured override or `~/.pyenv`.
    pub fn pyenv_root(&self) -> PathBuf {
        match &self.pyenv_root {
            Some(root) => PathBuf::from(shellexpand::tilde(root).to_string()),
            None => PathBuf::from(shellexpand::tilde("~/.pyenv").to_string()),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !crate::setup::python::looks_like_version(&self.python_version) {
            return Err(RigupError::Config(format!(
                "Invalid python_version '{}'. Use the full version, like '3.11.0'",
                self.python_version
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.python_version, "3.11.0");
        assert_eq!(config.docker_app, "/Applications/Docker.app");
        assert!(config.pyenv_root.is_none());
    }

    #[test]
    fn test_deserialize_partial_yaml() {
        let config: AppConfig = serde_yaml::from_str("python_version: \"3.12.1\"\n").unwrap();
        assert_eq!(config.python_version, "3.12.1");
        assert_eq!(config.docker_app, "/Applications/Docker.app");
    }

    #[test]
    fn test_serialize_skips_empty_root() {
        let yaml = serde_yaml::to_string(&AppConfig::default()).unwrap();
        assert!(!yaml.contains("pyenv_root"));
    }

    #[test]
    fn test_pyenv_root_override() {
        let config = AppConfig {
            pyenv_root: Some("/opt/pyenv".to_string()),
            ..Default::default()
        };
        assert_eq!(config.pyenv_root(), PathBuf::from("/opt/pyenv"));
    }

    #[test]
    fn test_validate_version_shape() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.python_version = "3.11".to_string();
        assert!(config.validate().is_err());

        config.python_version = "latest".to_string();
        assert!(config.validate().is_err());
    }
}
