use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found. Run 'valyan-admin config init' first.")]
    NotFound,
    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("No home directory to place the config in")]
    NoHomeDir,
    #[error("Invalid operator id '{0}'")]
    InvalidOperatorId(String),
}

/// Administration tool settings stored in ~/.valyan/config.json
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminConfig {
    /// sqlx connection URL, or "memory" for a throwaway store.
    #[serde(default)]
    pub database_url: Option<String>,
    /// tracing `EnvFilter` directive used when RUST_LOG is unset.
    #[serde(default)]
    pub log_filter: Option<String>,
    /// Accept permission codes outside the built-in catalog.
    #[serde(default)]
    pub allow_custom_permission_codes: bool,
    /// Principal recorded as the actor of administrative audit events.
    #[serde(default)]
    pub operator_id: Option<String>,
}

impl AdminConfig {
    /// Load config from default path (~/.valyan/config.json)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::default_path()?)
    }

    /// Load config from custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound
            } else {
                ConfigError::Read(e)
            }
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Like [`AdminConfig::load_from`], but a missing file yields the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load_from(path) {
            Err(ConfigError::NotFound) => Ok(Self::default()),
            other => other,
        }
    }

    /// Save config to default path
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::default_path()?)
    }

    /// Save config to custom path
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&self)?)?;
        Ok(())
    }

    /// Get default config path (~/.valyan/config.json)
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        Ok(dirs::home_dir()
            .ok_or(ConfigError::NoHomeDir)?
            .join(".valyan")
            .join("config.json"))
    }

    /// The configured operator as a UUID, if any.
    pub fn operator_uuid(&self) -> Result<Option<Uuid>, ConfigError> {
        self.operator_id
            .as_deref()
            .map(|id| Uuid::parse_str(id).map_err(|_| ConfigError::InvalidOperatorId(id.to_string())))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_admin_config_roundtrip() {
        let config = AdminConfig {
            database_url: Some("sqlite://clinic.db?mode=rwc".to_string()),
            log_filter: Some("valyan_authz=debug".to_string()),
            allow_custom_permission_codes: true,
            operator_id: Some(Uuid::new_v4().to_string()),
        };

        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AdminConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_optional_fields_absent() {
        let config: AdminConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AdminConfig::default());
        assert!(!config.allow_custom_permission_codes);
    }

    #[test]
    fn test_load_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(
            temp_file,
            r#"{{ "database_url": "memory", "allow_custom_permission_codes": true }}"#
        )
        .unwrap();

        let loaded = AdminConfig::load_from(temp_file.path()).unwrap();
        assert_eq!(loaded.database_url.as_deref(), Some("memory"));
        assert!(loaded.allow_custom_permission_codes);
        assert!(loaded.log_filter.is_none());
    }

    #[test]
    fn test_load_from_nonexistent_file() {
        let result = AdminConfig::load_from("/nonexistent/path/config.json");
        assert!(matches!(result, Err(ConfigError::NotFound)));

        let config = AdminConfig::load_or_default("/nonexistent/path/config.json").unwrap();
        assert_eq!(config, AdminConfig::default());
    }

    #[test]
    fn test_load_from_invalid_json() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{{ invalid json }}").unwrap();

        let result = AdminConfig::load_from(temp_file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
        // A broken file is not papered over with defaults.
        assert!(AdminConfig::load_or_default(temp_file.path()).is_err());
    }

    #[test]
    fn test_save_to_creates_parent_dirs() {
        let config = AdminConfig {
            log_filter: Some("info".to_string()),
            ..Default::default()
        };

        let temp_dir = tempfile::tempdir().unwrap();
        let nested_path = temp_dir
            .path()
            .join("nested")
            .join("dir")
            .join("config.json");

        config.save_to(&nested_path).unwrap();

        assert!(nested_path.exists());
        let loaded = AdminConfig::load_from(&nested_path).unwrap();
        assert_eq!(loaded.log_filter.as_deref(), Some("info"));
    }

    #[test]
    fn test_operator_uuid() {
        let id = Uuid::new_v4();
        let config = AdminConfig {
            operator_id: Some(id.to_string()),
            ..Default::default()
        };
        assert_eq!(config.operator_uuid().unwrap(), Some(id));

        assert_eq!(AdminConfig::default().operator_uuid().unwrap(), None);

        let bad = AdminConfig {
            operator_id: Some("not-a-uuid".to_string()),
            ..Default::default()
        };
        assert!(
            matches!(bad.operator_uuid(), Err(ConfigError::InvalidOperatorId(id)) if id == "not-a-uuid")
        );
    }

    #[test]
    fn test_config_error_display() {
        assert!(ConfigError::NotFound.to_string().contains("not found"));
        assert!(ConfigError::InvalidOperatorId("x".to_string())
            .to_string()
            .contains("'x'"));
    }

    #[test]
    fn test_default_path_returns_path() {
        if let Ok(path) = AdminConfig::default_path() {
            assert!(path.ends_with("config.json"));
            assert!(path.to_string_lossy().contains(".valyan"));
        }
    }
}
