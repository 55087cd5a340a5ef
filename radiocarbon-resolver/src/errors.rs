use radiocarbon_rpc_client::HistoryRpcClientError;
use solana_sdk::{clock::Slot, pubkey::Pubkey, signature::Signature};
use thiserror::Error;

pub type ResolverResult<T> = std::result::Result<T, ResolverError>;

/// Every failure a resolution can surface. Each variant renders a
/// distinct message so an operator can tell bad input from a provider
/// outage from an address that simply has no history.
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("'{0}' does not exist on chain; provide a valid program address")]
    ProgramNotFound(Pubkey),

    #[error("'{0}' is not an executable program account")]
    NotAProgramAccount(Pubkey),

    #[error(
        "'{0}' is a buffer or uninitialized program account which has no \
         deployment to date"
    )]
    UnsupportedProgramState(Pubkey),

    #[error("no transaction history found for '{0}'")]
    NoHistoryFound(Pubkey),

    #[error(
        "block time for slot {slot} (signature {signature}) has not been \
         assigned yet; retry once the slot is finalized"
    )]
    TimestampUnavailable { signature: Signature, slot: Slot },

    #[error(transparent)]
    RpcClient(#[from] HistoryRpcClientError),
}
