//! Configuration errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Invalid config format: {0}")]
    InvalidFormat(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConfigLoader, LoggingConfig};

    #[test]
    fn test_unknown_default_level() {
        let logging = LoggingConfig {
            default_level: "loud".to_string(),
            ..Default::default()
        };
        match logging.level().unwrap_err() {
            ConfigError::InvalidValue { field, message } => {
                assert_eq!(field, "logging.default_level");
                assert!(message.contains("loud"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_custom_level_names_job_type() {
        let mut logging = LoggingConfig::default();
        logging
            .custom_level
            .insert("sleep".to_string(), "verbose".to_string());

        let err = logging.custom_levels().unwrap_err();
        let display = err.to_string();
        assert!(display.contains("logging.custom_level.sleep"));
        assert!(display.contains("verbose"));
    }

    #[test]
    fn test_executor_section_type_error() {
        let err = ConfigLoader::load_str("[executor]\nmax_workers = \"four\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
        assert!(err.to_string().contains("max_workers"));
    }

    #[test]
    fn test_unset_variable_in_storage_directory() {
        let err = ConfigLoader::load_str(
            "[storage]\ndirectory = \"${JOBKEEPER_ERROR_TEST_UNSET}/data\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarNotSet(ref name) if name == "JOBKEEPER_ERROR_TEST_UNSET"));
    }

    #[test]
    fn test_missing_config_file() {
        let err = ConfigLoader::load(std::path::Path::new("/nonexistent/jobkeeper.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
        assert!(err.to_string().contains("jobkeeper.toml"));
    }
}
