pub mod error;
pub mod settings;

pub use error::*;
pub use settings::{Settings, TimeoutSettings, WaitSettings};

use std::path::{Path, PathBuf};

const CONFIG_ENV: &str = "STRATUS_CONFIG";
const CANDIDATES: [&str; 2] = ["stratus.local.yaml", "stratus.yaml"];

/// Stratus configuration directory (`~/.config/stratus`)
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("stratus");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Find the settings file.
///
/// Search order:
/// 1. `STRATUS_CONFIG` (path given directly)
/// 2. current directory: `stratus.local.yaml`, `stratus.yaml`
/// 3. `./.stratus/`: same order
/// 4. `~/.config/stratus/config.yaml`
pub fn find_config_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!("{} points at {}, which does not exist", CONFIG_ENV, path.display());
    }

    let current_dir = std::env::current_dir()?;

    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    let stratus_dir = current_dir.join(".stratus");
    if stratus_dir.is_dir() {
        for filename in &CANDIDATES {
            let path = stratus_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("stratus").join("config.yaml");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}

/// Load settings from `path`, then apply environment overrides
pub fn load_from(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)?;
    let mut settings = Settings::from_yaml(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    settings.apply_env();
    settings.validate()?;

    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

/// Load the discovered settings file. Without one, defaults plus
/// environment overrides are used.
pub fn load() -> Result<Settings> {
    match find_config_file() {
        Ok(path) => load_from(&path),
        Err(ConfigError::ConfigFileNotFound) => {
            tracing::debug!("No settings file found, using defaults");
            let mut settings = Settings::default();
            settings.apply_env();
            settings.validate()?;
            Ok(settings)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    fn test_get_config_dir() {
        let result = get_config_dir();
        assert!(result.is_ok());

        let config_dir = result.unwrap();
        assert!(config_dir.ends_with("stratus"));
        assert!(config_dir.exists());
    }

    #[test]
    #[serial]
    fn test_find_config_file_local_priority() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        fs::write(temp_dir.path().join("stratus.yaml"), "region: a").unwrap();
        fs::write(temp_dir.path().join("stratus.local.yaml"), "region: b").unwrap();

        std::env::set_current_dir(&temp_dir).unwrap();
        let result = temp_env::with_var_unset(CONFIG_ENV, find_config_file);
        std::env::set_current_dir(original_dir).unwrap();

        assert!(result.unwrap().ends_with("stratus.local.yaml"));
    }

    #[test]
    #[serial]
    fn test_find_config_file_in_stratus_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        let stratus_dir = temp_dir.path().join(".stratus");
        fs::create_dir(&stratus_dir).unwrap();
        fs::write(stratus_dir.join("stratus.yaml"), "region: a").unwrap();

        std::env::set_current_dir(&temp_dir).unwrap();
        let result = temp_env::with_var_unset(CONFIG_ENV, find_config_file);
        std::env::set_current_dir(original_dir).unwrap();

        assert!(result.unwrap().ends_with(".stratus/stratus.yaml"));
    }

    #[test]
    #[serial]
    fn test_find_config_file_env_var() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("custom.yaml");
        fs::write(&config_path, "region: custom").unwrap();

        let result = temp_env::with_var(CONFIG_ENV, Some(config_path.as_os_str()), find_config_file);
        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    #[serial]
    fn test_load_from_applies_env() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("stratus.yaml");
        fs::write(&config_path, "region: RegionOne\ntoken: file-token\n").unwrap();

        let settings = temp_env::with_vars(
            [
                ("OS_REGION_NAME", Some("RegionTwo")),
                ("OS_AUTH_TOKEN", None),
                ("OS_DEBUG", None),
            ],
            || load_from(&config_path),
        )
        .unwrap();

        assert_eq!(settings.region.as_deref(), Some("RegionTwo"));
        assert_eq!(settings.token.as_deref(), Some("file-token"));
        assert!(!settings.enable_logging);
    }

    #[test]
    #[serial]
    fn test_load_from_reports_parse_errors() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("stratus.yaml");
        fs::write(&config_path, "wait: [not, a, map]\n").unwrap();

        let err = load_from(&config_path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("stratus.yaml"));
    }
}
