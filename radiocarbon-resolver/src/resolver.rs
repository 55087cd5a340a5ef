use std::sync::Arc;

use log::*;
use radiocarbon_rpc_client::{HistoryRpcClient, ProviderRpc};
use solana_sdk::pubkey::Pubkey;

use crate::{
    cache::ResolutionCache,
    program_account::{self, WalkTarget},
    walker::HistoryWalker,
    ResolutionResult, ResolverError, ResolverResult,
};

#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// When false the cache lookup is skipped entirely (forced re-walk),
    /// but a successful resolution is still stored.
    pub use_cache: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self { use_cache: true }
    }
}

/// Orchestrates one resolution: address validation, cache lookup,
/// deployment-target selection, the history walk and the cache store.
/// Network selection happens at construction time via the injected
/// client; it determines the endpoint, never the algorithm.
pub struct Resolver<T: ProviderRpc> {
    client: HistoryRpcClient<T>,
    walker: HistoryWalker<T>,
    cache: Arc<dyn ResolutionCache>,
}

impl<T: ProviderRpc> Resolver<T> {
    pub fn new(
        client: HistoryRpcClient<T>,
        cache: Arc<dyn ResolutionCache>,
    ) -> Self {
        let walker = HistoryWalker::new(client.clone());
        Self {
            client,
            walker,
            cache,
        }
    }

    pub fn with_page_limit(mut self, page_limit: usize) -> Self {
        self.walker =
            HistoryWalker::with_page_limit(self.client.clone(), page_limit);
        self
    }

    pub fn cache(&self) -> &Arc<dyn ResolutionCache> {
        &self.cache
    }

    /// Resolves the first on-chain activity of `address`.
    ///
    /// The cache is only ever written after a fully successful walk, so
    /// an abort or failure at any point leaves it unchanged.
    pub async fn resolve(
        &self,
        address: &str,
        options: &ResolveOptions,
    ) -> ResolverResult<ResolutionResult> {
        let pubkey = address.parse::<Pubkey>().map_err(|err| {
            ResolverError::InvalidAddress {
                address: address.to_string(),
                reason: err.to_string(),
            }
        })?;

        if options.use_cache {
            if let Some(hit) = self.cache.get(&pubkey) {
                debug!("cache hit for {pubkey}");
                return Ok(hit);
            }
        } else {
            debug!("cache bypassed for {pubkey}");
        }

        let account = self
            .client
            .fetch_account(&pubkey)
            .await?
            .ok_or(ResolverError::ProgramNotFound(pubkey))?;

        let activity = match program_account::walk_target(&pubkey, &account)? {
            WalkTarget::Direct(target) => {
                self.walker.find_earliest_signature(&target).await?
            }
            WalkTarget::ProgramDataWithFallback {
                program,
                programdata,
            } => {
                match self.walker.find_earliest_signature(&programdata).await
                {
                    Ok(activity) => activity,
                    Err(ResolverError::NoHistoryFound(_)) => {
                        debug!(
                            "programdata {programdata} has no history, \
                             falling back to {program}"
                        );
                        self.walker.find_earliest_signature(&program).await?
                    }
                    Err(err) => return Err(err),
                }
            }
        };

        let result = ResolutionResult {
            address: pubkey,
            signature: activity.signature,
            slot: activity.slot,
            block_time: activity.block_time,
        };
        self.cache.put(pubkey, result.clone());
        info!(
            "first activity of {pubkey}: {} (slot {}, block time {})",
            result.signature, result.slot, result.block_time
        );
        Ok(result)
    }
}
