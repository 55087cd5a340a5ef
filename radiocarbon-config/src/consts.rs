/// Environment variable holding the Helius API key. The key is read at
/// client construction time and is never written to the config file.
pub const ENV_API_KEY: &str = "HELIUS_API_KEY";

/// Environment variable overriding the config file location.
pub const ENV_CONFIG_PATH: &str = "RADIOCARBON_CONFIG_PATH";

/// Environment variable overriding the cache directory.
pub const ENV_CACHE_DIR: &str = "RADIOCARBON_CACHE_DIR";

/// Directory under the user's home holding config and cache files.
pub const DATA_DIR_NAME: &str = ".radiocarbon";

pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const MAINNET_URL: &str = "https://mainnet.helius-rpc.com/";
pub const DEVNET_URL: &str = "https://devnet.helius-rpc.com/";
