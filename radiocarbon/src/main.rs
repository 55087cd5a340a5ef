use std::{
    error::Error,
    path::{Path, PathBuf},
    process,
    sync::Arc,
};

use clap::Parser;
use radiocarbon_config::{
    api_key_from_env, default_cache_dir, default_config_path, Network,
    RadiocarbonConfig,
};
use radiocarbon_resolver::{
    cache::{MemoryCache, ResolutionCache},
    ResolutionResult, ResolveOptions, Resolver,
};
use radiocarbon_rpc_client::{
    HistoryRpcClient, ProviderRpcImpl, RetryConfig,
};
use tokio::runtime::Builder;

use crate::{
    cli::{Cli, Command, ConfigAction, ConfigValues},
    file_cache::FileCache,
    output::TimestampFormat,
};

mod cli;
mod file_cache;
mod output;

type CommandResult = Result<(), Box<dyn Error>>;

fn main() {
    let cli = Cli::parse();
    // A resolution is a strictly sequential pipeline of network calls,
    // so a single-threaded runtime is all the tool needs.
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build async runtime");
    let outcome = runtime.block_on(run(cli));
    drop(runtime);

    if let Err(err) = outcome {
        eprintln!("{err}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> CommandResult {
    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };

    match cli.command {
        Command::Resolve {
            program_address,
            network,
            format,
            no_cache,
            verbose,
        } => {
            resolve_command(
                &config_path,
                &program_address,
                network,
                format,
                no_cache,
                verbose,
            )
            .await
        }
        Command::Setup { values, force } => {
            setup_command(&config_path, values, force)
        }
        Command::Config { action } => config_command(&config_path, action),
        Command::ClearCache { network } => clear_cache_command(network),
    }
}

async fn resolve_command(
    config_path: &Path,
    address: &str,
    network: Option<Network>,
    format: TimestampFormat,
    no_cache: bool,
    verbose: bool,
) -> CommandResult {
    let mut config = RadiocarbonConfig::load_or_default(config_path)?;
    if let Some(network) = network {
        config.network = network;
    }
    if verbose {
        config.verbose = true;
    }
    init_logger(&config);

    let result = resolve(&config, address, no_cache).await?;
    println!("{}", output::render(&result, format));
    Ok(())
}

async fn resolve(
    config: &RadiocarbonConfig,
    address: &str,
    no_cache: bool,
) -> Result<ResolutionResult, Box<dyn Error>> {
    let api_key = api_key_from_env()?;
    let url = config.network.rpc_url(&api_key);
    let provider = ProviderRpcImpl::from_url(url.as_str());
    let client = HistoryRpcClient::new(provider, RetryConfig::default());

    // With caching disabled in the config the resolver still gets a
    // cache to satisfy its store-on-success contract; it just is not a
    // persistent one.
    let cache: Arc<dyn ResolutionCache> = if config.cache {
        Arc::new(FileCache::load(cache_path(config.network)?))
    } else {
        Arc::new(MemoryCache::new())
    };

    let resolver = Resolver::new(client, cache);
    let options = ResolveOptions {
        use_cache: config.cache && !no_cache,
    };
    Ok(resolver.resolve(address, &options).await?)
}

fn setup_command(
    config_path: &Path,
    values: ConfigValues,
    force: bool,
) -> CommandResult {
    init_default_logger();

    if config_path.exists() && !force {
        let existing = RadiocarbonConfig::load(config_path)?;
        println!(
            "Existing configuration found at {}:",
            config_path.display()
        );
        print!("{existing}");
        println!("Pass --force to overwrite it.");
        return Ok(());
    }

    let config = RadiocarbonConfig {
        network: values.network.unwrap_or_default(),
        cache: values.cache.unwrap_or(true),
        verbose: values.verbose.unwrap_or(false),
        log_file: values.log_file,
    };
    config.save(config_path)?;
    println!("Configuration saved to {}", config_path.display());
    Ok(())
}

fn config_command(config_path: &Path, action: ConfigAction) -> CommandResult {
    init_default_logger();

    match action {
        ConfigAction::Show => {
            let config = RadiocarbonConfig::load_or_default(config_path)?;
            println!("# {}", config_path.display());
            print!("{config}");
        }
        ConfigAction::Set { values } => {
            if values.is_empty() {
                println!("Nothing was updated; no parameters were passed.");
                return Ok(());
            }
            let mut config = RadiocarbonConfig::load_or_default(config_path)?;
            if let Some(network) = values.network {
                config.network = network;
            }
            if let Some(cache) = values.cache {
                config.cache = cache;
            }
            if let Some(verbose) = values.verbose {
                config.verbose = verbose;
            }
            if let Some(log_file) = values.log_file {
                config.log_file = Some(log_file);
            }
            config.save(config_path)?;
            println!("Configuration updated to:");
            print!("{config}");
        }
    }
    Ok(())
}

fn clear_cache_command(network: Option<Network>) -> CommandResult {
    init_default_logger();

    let dir = default_cache_dir()?;
    let networks: Vec<Network> = match network {
        Some(network) => vec![network],
        None => Network::all().collect(),
    };
    for network in networks {
        let path = dir.join(network.cache_file_name());
        let cache = FileCache::load(path);
        let entries = cache.len();
        cache.clear();
        println!("Cleared {entries} cached resolution(s) for {network}.");
    }
    Ok(())
}

fn cache_path(network: Network) -> Result<PathBuf, Box<dyn Error>> {
    Ok(default_cache_dir()?.join(network.cache_file_name()))
}

fn init_logger(config: &RadiocarbonConfig) {
    let default_filter = if config.verbose { "debug" } else { "warn" };
    let env = env_logger::Env::default().default_filter_or(default_filter);
    let mut builder = env_logger::Builder::from_env(env);

    if let Some(path) = &config.log_file {
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
        {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(err) => eprintln!(
                "failed to open log file {}: {err}; logging to stderr",
                path.display()
            ),
        }
    }
    let _ = builder.try_init();
}

fn init_default_logger() {
    init_logger(&RadiocarbonConfig::default());
}
