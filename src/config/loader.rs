//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "TTYLINE";

/// Config file name
const CONFIG_FILE_NAME: &str = "ttyline.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "TTYLINE_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `TTYLINE_CONFIG` environment variable (explicit path)
    /// 2. `./ttyline.toml` (current directory)
    /// 3. The platform config directory (XDG on Linux/macOS)
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables can override individual values, and the
    /// resulting configuration is validated before it is returned.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = if let Some(ref path) = config_path {
            load_from_file(path)?
        } else {
            Config::default()
        };

        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        // Still apply env overrides even with defaults
        let _ = apply_env_overrides(&mut config);

        Self {
            config_path: None,
            config,
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get a mutable reference to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Save the current configuration to a specific file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        save_to_file(&self.config, path.as_ref())
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    // 1. Explicit environment variable
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. Current directory
    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    // 3. Platform config directory
    if let Some(dirs) = ProjectDirs::from("", "", "ttyline") {
        let app_config = dirs.config_dir().join(CONFIG_FILE_NAME);
        if app_config.exists() {
            return Some(app_config);
        }
    }

    // 4. No config file found - will use defaults
    None
}

/// Load configuration from a file.
fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(ConfigError::ParseError)
}

/// Save configuration to a file.
fn save_to_file(config: &Config, path: &Path) -> ConfigResult<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `TTYLINE_<SECTION>_<KEY>`
/// For example:
/// - `TTYLINE_DEVICE_PATH=/dev/ttyUSB1`
/// - `TTYLINE_LINE_BAUD=115200`
/// - `TTYLINE_LINE_MODE=7E2`
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    // Device overrides
    if let Ok(val) = std::env::var(format!("{}_DEVICE_PATH", ENV_PREFIX)) {
        config.device.path = Some(val);
    }

    // Line overrides
    if let Ok(val) = std::env::var(format!("{}_LINE_BAUD", ENV_PREFIX)) {
        config.line.baud = val.parse().map_err(|_| {
            ConfigError::env_parse(format!("{}_LINE_BAUD", ENV_PREFIX), "invalid baud rate")
        })?;
    }
    if let Ok(val) = std::env::var(format!("{}_LINE_MODE", ENV_PREFIX)) {
        config.line.mode = val;
    }
    if let Ok(val) = std::env::var(format!("{}_LINE_READ_TIMEOUT_DS", ENV_PREFIX)) {
        config.line.read_timeout_ds = val.parse().map_err(|_| {
            ConfigError::env_parse(
                format!("{}_LINE_READ_TIMEOUT_DS", ENV_PREFIX),
                "invalid timeout",
            )
        })?;
    }
    if let Ok(val) = std::env::var(format!("{}_LINE_FLOW_CONTROL", ENV_PREFIX)) {
        config.line.flow_control = val.to_lowercase() == "true" || val == "1";
    }

    // Logging overrides
    if let Ok(val) = std::env::var(format!("{}_LOGGING_LEVEL", ENV_PREFIX)) {
        config.logging.level = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::env;

    #[test]
    fn test_default_loader() {
        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().line.baud, 9600);
        assert_eq!(loader.config().line.mode, "8N1");
    }

    #[test]
    fn test_env_override() {
        // Use a key no other test asserts on; the process environment is
        // shared across test threads.
        env::set_var("TTYLINE_LOGGING_LEVEL", "trace");

        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().logging.level, "trace");

        env::remove_var("TTYLINE_LOGGING_LEVEL");
    }

    #[test]
    fn test_load_from_file_and_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ttyline.toml");
        std::fs::write(
            &path,
            r#"
            [device]
            path = "/dev/ttyACM0"

            [line]
            baud = 19200
            mode = "7E2"
            read_timeout_ds = 10
            "#,
        )
        .unwrap();

        let loader = ConfigLoader::load_from(&path).unwrap();
        assert_eq!(loader.config().device.path.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(loader.config().line.baud, 19_200);
        assert_eq!(loader.config().line.mode, "7E2");
        assert_eq!(loader.config().line.read_timeout_ds, 10);

        let saved = dir.path().join("saved").join("ttyline.toml");
        loader.save_to(&saved).unwrap();
        let reloaded = ConfigLoader::load_from(&saved).unwrap();
        assert_eq!(reloaded.config().line.baud, 19_200);
        assert_eq!(reloaded.config().line.mode, "7E2");
    }

    #[test]
    fn test_load_rejects_invalid_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ttyline.toml");
        std::fs::write(&path, "[line]\nmode = \"X9Z\"\n").unwrap();

        let err = ConfigLoader::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("line.mode"));
    }
}
