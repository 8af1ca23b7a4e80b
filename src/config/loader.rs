//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::{Config, LogFormat};
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "TTYPORT";

/// Config file name inside the per-user config directory
const CONFIG_FILE_NAME: &str = "config.toml";

/// Config file name looked up in the current directory
const LOCAL_CONFIG_FILE_NAME: &str = "ttyport.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "TTYPORT_CONFIG";

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
    /// 1. `TTYPORT_CONFIG` environment variable (explicit path)
    /// 2. `./ttyport.toml` (current directory)
    /// 3. `$XDG_CONFIG_HOME/ttyport/config.toml` or `~/.config/ttyport/config.toml`
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables can override any config file values.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = if let Some(ref path) = config_path {
            load_from_file(path)?
        } else {
            Config::default()
        };

        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self { config_path, config })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with the built-in defaults only.
    pub fn with_defaults() -> Self {
        Self {
            config_path: None,
            config: Config::default(),
        }
    }

    /// Built-in defaults plus environment overrides, validated.
    ///
    /// Used when no config file could be read. A bad override is an error
    /// here just as it is in [`load`](Self::load).
    pub fn from_env() -> ConfigResult<Self> {
        let mut config = Config::default();
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path: None,
            config,
        })
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

    /// Save the current configuration to file.
    pub fn save(&self) -> ConfigResult<()> {
        let path = self
            .config_path
            .as_ref()
            .ok_or(ConfigError::NoPath)?;

        save_to_file(&self.config, path)
    }

    /// Save the current configuration to a specific file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        save_to_file(&self.config, path.as_ref())
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let cwd_config = PathBuf::from(LOCAL_CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    get_default_config_path().filter(|p| p.exists())
}

/// Get the platform config directory (`$XDG_CONFIG_HOME` or `~/.config`).
fn get_config_dir() -> Option<PathBuf> {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
}

/// Load configuration from a file.
fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Save configuration to a file.
fn save_to_file(config: &Config, path: &Path) -> ConfigResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

fn env_var(key: &str) -> Option<(String, String)> {
    let name = format!("{}_{}", ENV_PREFIX, key);
    std::env::var(&name).ok().map(|val| (name, val))
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `TTYPORT_<SECTION>_<KEY>`
/// For example:
/// - `TTYPORT_SERIAL_DEVICE=/dev/ttyACM0`
/// - `TTYPORT_SERIAL_BAUD=9600`
/// - `TTYPORT_LOGGING_LEVEL=debug`
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    // Serial overrides
    if let Some((_, val)) = env_var("SERIAL_DEVICE") {
        config.serial.device = val;
    }
    if let Some((name, val)) = env_var("SERIAL_BAUD") {
        config.serial.baud = val
            .parse()
            .map_err(|_| ConfigError::env_parse(name, "Invalid baud rate"))?;
    }
    if let Some((name, val)) = env_var("SERIAL_CANONICAL") {
        config.serial.canonical = match val.to_lowercase().as_str() {
            "1" | "true" | "yes" => true,
            "0" | "false" | "no" => false,
            _ => return Err(ConfigError::env_parse(name, "Expected true or false")),
        };
    }
    if let Some((name, val)) = env_var("SERIAL_READ_SIZE") {
        config.serial.read_size = val
            .parse()
            .map_err(|_| ConfigError::env_parse(name, "Invalid read size"))?;
    }

    // Logging overrides
    if let Some((_, val)) = env_var("LOGGING_LEVEL") {
        config.logging.level = val;
    }
    if let Some((name, val)) = env_var("LOGGING_FORMAT") {
        config.logging.format = val
            .parse::<LogFormat>()
            .map_err(|_| ConfigError::env_parse(name, "Expected json, pretty or compact"))?;
    }

    Ok(())
}

/// Get the default config directory for creating new config files.
pub fn get_default_config_dir() -> Option<PathBuf> {
    get_config_dir().map(|d| d.join("ttyport"))
}

/// Get the default config file path for creating new config files.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_default_config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_default_loader() {
        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().serial.baud, 4800);
        assert!(loader.config_path.is_none());
    }

    #[test]
    #[serial]
    fn test_env_override() {
        env::set_var("TTYPORT_SERIAL_BAUD", "9600");
        env::set_var("TTYPORT_SERIAL_CANONICAL", "false");

        let loader = ConfigLoader::from_env().unwrap();
        assert_eq!(loader.config().serial.baud, 9600);
        assert!(!loader.config().serial.canonical);

        env::remove_var("TTYPORT_SERIAL_BAUD");
        env::remove_var("TTYPORT_SERIAL_CANONICAL");
    }

    #[test]
    #[serial]
    fn test_bad_env_value_is_reported() {
        env::set_var("TTYPORT_SERIAL_BAUD", "fast");

        let mut config = Config::default();
        let err = apply_env_overrides(&mut config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Env { ref var, .. } if var == "TTYPORT_SERIAL_BAUD"
        ));

        env::remove_var("TTYPORT_SERIAL_BAUD");
    }

    #[test]
    #[serial]
    fn test_defaults_ignore_environment() {
        env::set_var("TTYPORT_SERIAL_READ_SIZE", "0");

        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().serial.read_size, 255);

        env::remove_var("TTYPORT_SERIAL_READ_SIZE");
    }

    #[test]
    #[serial]
    fn test_from_env_validates_overrides() {
        env::set_var("TTYPORT_SERIAL_READ_SIZE", "0");
        let err = ConfigLoader::from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { ref key, .. } if key == "serial.read_size"
        ));
        env::remove_var("TTYPORT_SERIAL_READ_SIZE");

        env::set_var("TTYPORT_SERIAL_CANONICAL", "maybe");
        let err = ConfigLoader::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Env { .. }));
        env::remove_var("TTYPORT_SERIAL_CANONICAL");
    }

    #[test]
    #[serial]
    fn test_save_without_path_fails() {
        let err = ConfigLoader::with_defaults().save().unwrap_err();
        assert!(matches!(err, ConfigError::NoPath));
    }

    #[test]
    #[serial]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ttyport.toml");

        let mut loader = ConfigLoader::with_defaults();
        loader.config_mut().serial.device = "/dev/ttyS3".to_string();
        loader.config_mut().serial.baud = 57600;
        loader.save_to(&path).unwrap();

        let loaded = ConfigLoader::load_from(&path).unwrap();
        assert_eq!(loaded.config_path.as_deref(), Some(path.as_path()));
        assert_eq!(loaded.config().serial.device, "/dev/ttyS3");
        assert_eq!(loaded.config().serial.baud, 57600);
    }

    #[test]
    #[serial]
    fn test_load_from_missing_file() {
        let err = ConfigLoader::load_from("/nonexistent/ttyport.toml").unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    #[serial]
    fn test_load_from_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ttyport.toml");
        std::fs::write(&path, "[serial]\nread_size = 0\n").unwrap();

        let err = ConfigLoader::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    #[serial]
    fn test_explicit_config_env_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[serial]\ndevice = \"/dev/ttyACM7\"\n").unwrap();
        env::set_var("TTYPORT_CONFIG", &path);

        assert_eq!(resolve_config_path(), Some(path.clone()));
        let loader = ConfigLoader::load().unwrap();
        assert_eq!(loader.config().serial.device, "/dev/ttyACM7");

        env::remove_var("TTYPORT_CONFIG");
    }
}
