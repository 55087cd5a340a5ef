use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

pub mod consts;
mod errors;
mod network;

pub use errors::{ConfigError, ConfigResult};
pub use network::Network;

/// Tool configuration, persisted as TOML. Provider credentials are
/// deliberately not part of this record; they are resolved from the
/// environment via [api_key_from_env].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RadiocarbonConfig {
    /// Cluster to resolve against.
    pub network: Network,

    /// Whether resolutions consult the persistent result cache.
    pub cache: bool,

    /// Raises the default log filter to debug.
    pub verbose: bool,

    /// Redirects log output to a file instead of stderr.
    pub log_file: Option<PathBuf>,
}

impl Default for RadiocarbonConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            cache: true,
            verbose: false,
            log_file: None,
        }
    }
}

impl RadiocarbonConfig {
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let raw = fs::read_to_string(path).map_err(|source| {
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Like [Self::load] but a missing file yields the defaults, so the
    /// tool works before `setup` was ever run.
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let rendered = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| {
                ConfigError::Write {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
        }
        fs::write(path, rendered).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl fmt::Display for RadiocarbonConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match toml::to_string_pretty(self) {
            Ok(rendered) => f.write_str(&rendered),
            Err(_) => Err(fmt::Error),
        }
    }
}

/// Resolves the provider API key from the environment. Missing or empty
/// keys fail before any network call is made.
pub fn api_key_from_env() -> ConfigResult<String> {
    match env::var(consts::ENV_API_KEY) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(ConfigError::MissingApiKey),
    }
}

/// Config file location: `RADIOCARBON_CONFIG_PATH` if set, otherwise
/// `~/.radiocarbon/config.toml`.
pub fn default_config_path() -> ConfigResult<PathBuf> {
    if let Some(path) = env::var_os(consts::ENV_CONFIG_PATH) {
        return Ok(PathBuf::from(path));
    }
    Ok(data_dir()?.join(consts::CONFIG_FILE_NAME))
}

/// Cache directory: `RADIOCARBON_CACHE_DIR` if set, otherwise
/// `~/.radiocarbon`.
pub fn default_cache_dir() -> ConfigResult<PathBuf> {
    if let Some(dir) = env::var_os(consts::ENV_CACHE_DIR) {
        return Ok(PathBuf::from(dir));
    }
    data_dir()
}

fn data_dir() -> ConfigResult<PathBuf> {
    env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(consts::DATA_DIR_NAME))
        .ok_or(ConfigError::NoHomeDir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RadiocarbonConfig::default();
        assert_eq!(config.network, Network::Mainnet);
        assert!(config.cache);
        assert!(!config.verbose);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = RadiocarbonConfig {
            network: Network::Devnet,
            cache: false,
            verbose: true,
            log_file: Some(PathBuf::from("/tmp/radiocarbon.log")),
        };

        config.save(&path).unwrap();
        let loaded = RadiocarbonConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let loaded = RadiocarbonConfig::load_or_default(&path).unwrap();
        assert_eq!(loaded, RadiocarbonConfig::default());
    }

    #[test]
    fn test_load_rejects_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "network = \"devnet\"\nbogus = 1\n").unwrap();
        assert!(matches!(
            RadiocarbonConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "network = \"devnet\"\n").unwrap();
        let loaded = RadiocarbonConfig::load(&path).unwrap();
        assert_eq!(loaded.network, Network::Devnet);
        assert!(loaded.cache);
    }

    #[test]
    fn test_display_renders_toml() {
        let rendered = RadiocarbonConfig::default().to_string();
        assert!(rendered.contains("network = \"mainnet\""));
        assert!(rendered.contains("cache = true"));
    }
}
