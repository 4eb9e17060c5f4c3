//! Configuration loader.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::ConfigError;
use crate::schema::Config;

/// Default config location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/jobkeeper.toml";

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Load the first config file found, or the defaults when there is
    /// none. An explicitly given path must exist.
    ///
    /// Looks at `path`, then [`DEFAULT_CONFIG_PATH`], then
    /// `<config dir>/jobkeeper/jobkeeper.toml`.
    pub fn discover(path: Option<&Path>) -> Result<(Config, Option<PathBuf>), ConfigError> {
        if let Some(path) = path {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }

        for candidate in Self::candidates() {
            if candidate.exists() {
                let config = Self::load(&candidate)?;
                return Ok((config, Some(candidate)));
            }
        }

        Ok((Config::default(), None))
    }

    fn candidates() -> Vec<PathBuf> {
        let mut candidates = vec![PathBuf::from(DEFAULT_CONFIG_PATH)];
        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join("jobkeeper").join("jobkeeper.toml"));
        }
        candidates
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;

        let mut result = content.to_string();
        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.jobkeeper`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert!(config.register_default_jobs);
        assert_eq!(config.scheduler.interval_secs, 60);
    }

    #[test]
    fn test_load_full_config() {
        let content = r#"
            register_default_jobs = false

            [storage]
            driver = "memory"
            directory = "/var/lib/jobkeeper"

            [logging]
            handler = "memory"
            directory = "/var/log/jobkeeper"
            default_level = "warning"

            [logging.custom_level]
            sleep = "error"

            [executor]
            mode = "background"
            max_workers = 8
            listener_timeout_ms = 250

            [scheduler]
            interval_secs = 5
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert!(!config.register_default_jobs);
        assert_eq!(config.storage.driver, "memory");
        assert_eq!(config.logging.default_level, "warning");
        assert_eq!(config.logging.custom_level["sleep"], "error");
        assert_eq!(config.executor.mode, "background");
        assert_eq!(config.executor.max_workers, 8);
        assert_eq!(config.executor.listener_timeout_ms, 250);
        assert_eq!(config.scheduler.interval_secs, 5);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[scheduler]").unwrap();
        writeln!(file, "interval_secs = 15").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.scheduler.interval_secs, 15);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/jobkeeper.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_discover_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "register_default_jobs = false").unwrap();

        let (config, source) = ConfigLoader::discover(Some(file.path())).unwrap();
        assert!(!config.register_default_jobs);
        assert_eq!(source.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_discover_missing_explicit_path() {
        let result = ConfigLoader::discover(Some(Path::new("/nonexistent/jobkeeper.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("invalid = [unclosed");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: test-only variable, not read elsewhere
        unsafe {
            std::env::set_var("JOBKEEPER_TEST_DATA_DIR", "/tmp/jobkeeper-test");
        }
        let content = "[storage]\ndirectory = \"${JOBKEEPER_TEST_DATA_DIR}\"";
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.storage.directory, "/tmp/jobkeeper-test");
        unsafe {
            std::env::remove_var("JOBKEEPER_TEST_DATA_DIR");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "value = \"${JOBKEEPER_UNSET_TEST_VAR_12345}\"";
        let result = ConfigLoader::expand_env_vars(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = ConfigLoader::expand_path("~/test");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("/test"));
    }

    #[test]
    fn test_expand_path_no_tilde() {
        assert_eq!(ConfigLoader::expand_path("/usr/local"), "/usr/local");
    }
}
