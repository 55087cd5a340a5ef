use std::sync::Arc;

use async_trait::async_trait;
use solana_rpc_client::{
    nonblocking::rpc_client::RpcClient,
    rpc_client::GetConfirmedSignaturesForAddress2Config,
};
use solana_rpc_client_api::{
    client_error::Result as ClientResult,
    custom_error::{
        JSON_RPC_SERVER_ERROR_BLOCK_NOT_AVAILABLE,
        JSON_RPC_SERVER_ERROR_LONG_TERM_STORAGE_SLOT_SKIPPED,
        JSON_RPC_SERVER_ERROR_SLOT_SKIPPED,
    },
    request::RpcError,
    response::RpcConfirmedTransactionStatusWithSignature,
};
use solana_sdk::{
    account::Account,
    clock::{Slot, UnixTimestamp},
    commitment_config::CommitmentConfig,
    pubkey::Pubkey,
    signature::Signature,
};

// -----------------
// Trait
// -----------------

/// The raw provider operations the resolution pipeline consumes. Kept thin
/// so tests can swap in a scripted mock; retry and error classification
/// live in [crate::HistoryRpcClient] on top of this.
#[async_trait]
pub trait ProviderRpc: Send + Sync + Clone + 'static {
    fn url(&self) -> String;

    /// One page of transaction signatures for `address`, newest first,
    /// strictly older than `before` when a cursor is given.
    async fn get_signatures_for_address(
        &self,
        address: &Pubkey,
        before: Option<Signature>,
        limit: usize,
    ) -> ClientResult<Vec<RpcConfirmedTransactionStatusWithSignature>>;

    /// Block time of a slot. `None` when the ledger has not assigned one
    /// (yet), which is distinct from a provider failure.
    async fn get_block_time(
        &self,
        slot: Slot,
    ) -> ClientResult<Option<UnixTimestamp>>;

    /// `None` when the account does not exist on chain.
    async fn get_account(
        &self,
        pubkey: &Pubkey,
    ) -> ClientResult<Option<Account>>;
}

// -----------------
// Implementation
// -----------------

#[derive(Clone)]
pub struct ProviderRpcImpl {
    client: Arc<RpcClient>,
}

impl ProviderRpcImpl {
    pub fn new(client: RpcClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Deployment times only make sense for finalized history, so the
    /// client always queries at finalized commitment.
    pub fn from_url(url: &str) -> Self {
        Self::new(RpcClient::new_with_commitment(
            url.to_string(),
            CommitmentConfig::finalized(),
        ))
    }
}

#[async_trait]
impl ProviderRpc for ProviderRpcImpl {
    fn url(&self) -> String {
        self.client.url()
    }

    async fn get_signatures_for_address(
        &self,
        address: &Pubkey,
        before: Option<Signature>,
        limit: usize,
    ) -> ClientResult<Vec<RpcConfirmedTransactionStatusWithSignature>> {
        self.client
            .get_signatures_for_address_with_config(
                address,
                GetConfirmedSignaturesForAddress2Config {
                    before,
                    until: None,
                    limit: Some(limit),
                    commitment: Some(self.client.commitment()),
                },
            )
            .await
    }

    async fn get_block_time(
        &self,
        slot: Slot,
    ) -> ClientResult<Option<UnixTimestamp>> {
        let err = match self.client.get_block_time(slot).await {
            Ok(timestamp) => return Ok(Some(timestamp)),
            Err(err) => err,
        };
        if block_time_absent(&err) {
            return Ok(None);
        }
        Err(err)
    }

    async fn get_account(
        &self,
        pubkey: &Pubkey,
    ) -> ClientResult<Option<Account>> {
        self.client
            .get_account_with_commitment(pubkey, self.client.commitment())
            .await
            .map(|response| response.value)
    }
}

/// A block-time lookup can fail because the slot genuinely carries no
/// timestamp (skipped, or not yet finalized). Those responses mean
/// "absent", not "broken".
fn block_time_absent(
    err: &solana_rpc_client_api::client_error::Error,
) -> bool {
    use solana_rpc_client_api::client_error::ErrorKind;
    match &err.kind {
        ErrorKind::RpcError(RpcError::ForUser(message)) => {
            message.starts_with("Block Not Found")
        }
        ErrorKind::RpcError(RpcError::RpcResponseError { code, .. }) => {
            matches!(
                *code,
                JSON_RPC_SERVER_ERROR_BLOCK_NOT_AVAILABLE
                    | JSON_RPC_SERVER_ERROR_SLOT_SKIPPED
                    | JSON_RPC_SERVER_ERROR_LONG_TERM_STORAGE_SLOT_SKIPPED
            )
        }
        _ => false,
    }
}
