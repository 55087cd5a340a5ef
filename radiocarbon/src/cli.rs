use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use radiocarbon_config::Network;

use crate::output::TimestampFormat;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Dates the first on-chain activity of a Solana program"
)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, env = "RADIOCARBON_CONFIG_PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve the deployment time of a program address.
    #[command(visible_alias = "get-deployment-time")]
    Resolve {
        /// Base58-encoded program address.
        program_address: String,

        /// Override the configured network for this invocation.
        #[arg(long, short)]
        network: Option<Network>,

        /// How to render the resolved timestamp.
        #[arg(long, short, value_enum, default_value_t = TimestampFormat::Unix)]
        format: TimestampFormat,

        /// Skip the cache lookup and walk the full history again. The
        /// fresh result is still stored on success.
        #[arg(long)]
        no_cache: bool,

        /// Raise log verbosity for this invocation.
        #[arg(long, short)]
        verbose: bool,
    },

    /// Write a fresh configuration file.
    Setup {
        #[command(flatten)]
        values: ConfigValues,

        /// Overwrite an existing configuration file.
        #[arg(long)]
        force: bool,
    },

    /// View or update the stored configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Drop cached resolutions.
    ClearCache {
        /// Only clear this network's cache instead of all of them.
        #[arg(long, short)]
        network: Option<Network>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the active configuration.
    Show,

    /// Update individual configuration values.
    Set {
        #[command(flatten)]
        values: ConfigValues,
    },
}

#[derive(Debug, Args)]
pub struct ConfigValues {
    /// The network to resolve against: "mainnet" or "devnet".
    #[arg(long, short)]
    pub network: Option<Network>,

    /// Whether resolutions consult the persistent result cache.
    #[arg(long)]
    pub cache: Option<bool>,

    /// Enable verbose logging by default.
    #[arg(long)]
    pub verbose: Option<bool>,

    /// Redirect log output to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl ConfigValues {
    pub fn is_empty(&self) -> bool {
        self.network.is_none()
            && self.cache.is_none()
            && self.verbose.is_none()
            && self.log_file.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_args_parse() {
        let cli = Cli::try_parse_from([
            "radiocarbon",
            "resolve",
            "CAMMCzo5YL8w4VFF8KVHrK22GGUsp5VTaW7grrKgrWqK",
            "--network",
            "devnet",
            "--format",
            "human",
            "--no-cache",
        ])
        .unwrap();

        match cli.command {
            Command::Resolve {
                program_address,
                network,
                format,
                no_cache,
                verbose,
            } => {
                assert_eq!(
                    program_address,
                    "CAMMCzo5YL8w4VFF8KVHrK22GGUsp5VTaW7grrKgrWqK"
                );
                assert_eq!(network, Some(Network::Devnet));
                assert_eq!(format, TimestampFormat::Human);
                assert!(no_cache);
                assert!(!verbose);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_get_deployment_time_alias() {
        let cli = Cli::try_parse_from([
            "radiocarbon",
            "get-deployment-time",
            "CAMMCzo5YL8w4VFF8KVHrK22GGUsp5VTaW7grrKgrWqK",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Resolve { .. }));
    }

    #[test]
    fn test_clear_cache_without_network_means_all() {
        let cli =
            Cli::try_parse_from(["radiocarbon", "clear-cache"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::ClearCache { network: None }
        ));
    }
}
