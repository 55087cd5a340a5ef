use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use url::Url;

use crate::consts;

/// The Solana cluster a resolution runs against. Network selection only
/// determines the provider endpoint, never the algorithm.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Network {
    #[default]
    Mainnet,
    Devnet,
}

impl Network {
    pub fn all() -> impl Iterator<Item = Network> {
        <Network as strum::IntoEnumIterator>::iter()
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            Network::Mainnet => consts::MAINNET_URL,
            Network::Devnet => consts::DEVNET_URL,
        }
    }

    /// Builds the provider endpoint with the `api-key` query parameter
    /// Helius expects.
    pub fn rpc_url(&self, api_key: &str) -> Url {
        let mut url = Url::parse(self.base_url())
            .expect("static provider URL should be valid");
        url.query_pairs_mut().append_pair("api-key", api_key);
        url
    }

    /// Name of the cache file for this network. Resolutions on different
    /// networks never share cache entries.
    pub fn cache_file_name(&self) -> String {
        format!("cache-{self}.json")
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_parse_and_display_roundtrip() {
        for network in [Network::Mainnet, Network::Devnet] {
            let parsed = Network::from_str(&network.to_string()).unwrap();
            assert_eq!(parsed, network);
        }
        assert_eq!(Network::from_str("MAINNET").unwrap(), Network::Mainnet);
        assert!(Network::from_str("testnet").is_err());
    }

    #[test]
    fn test_rpc_url_carries_api_key() {
        let url = Network::Devnet.rpc_url("secret123");
        assert_eq!(url.host_str(), Some("devnet.helius-rpc.com"));
        assert!(url
            .query_pairs()
            .any(|(k, v)| k == "api-key" && v == "secret123"));
    }

    #[test]
    fn test_cache_file_names_are_distinct() {
        assert_eq!(Network::Mainnet.cache_file_name(), "cache-mainnet.json");
        assert_eq!(Network::Devnet.cache_file_name(), "cache-devnet.json");
    }
}
