use std::time::Duration;

use log::*;
use solana_rpc_client_api::{
    client_error::{Error as ClientError, ErrorKind as ClientErrorKind},
    request::RpcError,
    response::RpcConfirmedTransactionStatusWithSignature,
};
use solana_sdk::{
    account::Account,
    clock::{Slot, UnixTimestamp},
    pubkey::Pubkey,
    signature::Signature,
};
use tokio::time::sleep;

mod provider;
#[cfg(any(test, feature = "dev-context"))]
pub mod testing;

pub use provider::{ProviderRpc, ProviderRpcImpl};

/// Hard cap the provider places on one signature-history page.
pub const MAX_SIGNATURE_PAGE_LIMIT: usize = 1_000;

// -----------------
// HistoryRpcClientError
// -----------------
#[derive(Debug, thiserror::Error)]
pub enum HistoryRpcClientError {
    #[error(
        "provider unavailable: {what} still failing after {attempts} \
         attempts: {source}"
    )]
    ProviderUnavailable {
        what: &'static str,
        attempts: usize,
        #[source]
        source: ClientError,
    },

    #[error("malformed provider response: {0}")]
    ProtocolError(String),

    #[error("provider rejected credentials: {0}")]
    Unauthorized(#[source] ClientError),
}

pub type HistoryRpcClientResult<T> =
    std::result::Result<T, HistoryRpcClientError>;

// -----------------
// Failure classification
// -----------------

/// How a raw client failure maps onto the retry policy: transient faults
/// are retried with backoff, credential and protocol faults never are.
#[derive(Debug, PartialEq, Eq)]
enum Classification {
    Retryable,
    Unauthorized,
    Fatal,
}

fn classify(err: &ClientError) -> Classification {
    use Classification::*;
    match &err.kind {
        ClientErrorKind::Io(_) | ClientErrorKind::Middleware(_) => Retryable,
        ClientErrorKind::Reqwest(err) => classify_http(err),
        ClientErrorKind::RpcError(rpc_err) => match rpc_err {
            RpcError::RpcRequestError(_) => Retryable,
            RpcError::RpcResponseError { code, .. } => {
                classify_response_code(*code)
            }
            RpcError::ParseError(_) => Fatal,
            RpcError::ForUser(_) => Fatal,
        },
        ClientErrorKind::SerdeJson(_) => Fatal,
        _ => Fatal,
    }
}

fn classify_http(err: &reqwest::Error) -> Classification {
    use Classification::*;
    if let Some(status) = err.status() {
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Unauthorized;
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || status.is_server_error()
        {
            return Retryable;
        }
    }
    if err.is_decode() {
        return Fatal;
    }
    // Remaining transport failures (timeouts, resets, DNS) are worth
    // another attempt.
    Retryable
}

/// Some providers surface HTTP statuses as JSON-RPC error codes; Solana
/// nodes use the -32xxx range for their own transient conditions
/// (node unhealthy, slot not available yet).
fn classify_response_code(code: i64) -> Classification {
    use solana_rpc_client_api::custom_error::{
        JSON_RPC_SERVER_ERROR_BLOCK_NOT_AVAILABLE,
        JSON_RPC_SERVER_ERROR_MIN_CONTEXT_SLOT_NOT_REACHED,
        JSON_RPC_SERVER_ERROR_NODE_UNHEALTHY,
    };
    use Classification::*;
    match code {
        401 | 403 => Unauthorized,
        429 => Retryable,
        500..=599 => Retryable,
        JSON_RPC_SERVER_ERROR_NODE_UNHEALTHY
        | JSON_RPC_SERVER_ERROR_BLOCK_NOT_AVAILABLE
        | JSON_RPC_SERVER_ERROR_MIN_CONTEXT_SLOT_NOT_REACHED => Retryable,
        _ => Fatal,
    }
}

// -----------------
// RetryConfig
// -----------------
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the initial attempt; `max_retries + 1` attempts total.
    pub max_retries: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryConfig {
    /// Exponential backoff, capped at `max_delay`.
    pub fn delay(&self, attempt: usize) -> Duration {
        let factor = 1u32.checked_shl(attempt as u32).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

// -----------------
// HistoryPage
// -----------------

/// One page of signature history, newest first, plus the limit it was
/// fetched with so the walker can tell a full page from the final short
/// one.
#[derive(Debug, Clone)]
pub struct HistoryPage {
    pub records: Vec<RpcConfirmedTransactionStatusWithSignature>,
    limit: usize,
}

impl HistoryPage {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// A page shorter than the requested limit has no history behind it.
    pub fn is_final(&self) -> bool {
        self.records.len() < self.limit
    }

    /// Oldest record of the page; page order is authoritative for
    /// recency, so this is always the last entry.
    pub fn oldest(&self) -> Option<&RpcConfirmedTransactionStatusWithSignature> {
        self.records.last()
    }

    /// Continuation cursor for the next (older) page.
    pub fn next_cursor(&self) -> HistoryRpcClientResult<Option<Signature>> {
        self.oldest()
            .map(|record| parse_signature(&record.signature))
            .transpose()
    }
}

/// Signatures come over the wire as strings; one that does not parse is a
/// provider schema violation.
pub fn parse_signature(raw: &str) -> HistoryRpcClientResult<Signature> {
    raw.parse::<Signature>().map_err(|err| {
        HistoryRpcClientError::ProtocolError(format!(
            "signature '{raw}' is not valid base58: {err}"
        ))
    })
}

// -----------------
// HistoryRpcClient
// -----------------

/// Wraps a [ProviderRpc] with page-limit clamping, bounded-backoff
/// retries on transient failures and classification of everything else.
/// One walk issues its page requests strictly sequentially (the next
/// cursor is only known once the previous page arrived); the client is
/// cheap to clone so independent resolutions can run concurrently.
#[derive(Clone)]
pub struct HistoryRpcClient<T: ProviderRpc> {
    provider: T,
    retry: RetryConfig,
}

impl<T: ProviderRpc> HistoryRpcClient<T> {
    pub fn new(provider: T, retry: RetryConfig) -> Self {
        Self { provider, retry }
    }

    pub fn url(&self) -> String {
        self.provider.url()
    }

    pub async fn fetch_history_page(
        &self,
        address: &Pubkey,
        before: Option<Signature>,
        limit: usize,
    ) -> HistoryRpcClientResult<HistoryPage> {
        let limit = limit.clamp(1, MAX_SIGNATURE_PAGE_LIMIT);
        let records = self
            .with_retries("getSignaturesForAddress", || {
                self.provider
                    .get_signatures_for_address(address, before, limit)
            })
            .await?;
        trace!(
            "fetched {} signature(s) for {address} (before: {before:?})",
            records.len()
        );
        Ok(HistoryPage { records, limit })
    }

    pub async fn fetch_block_time(
        &self,
        slot: Slot,
    ) -> HistoryRpcClientResult<Option<UnixTimestamp>> {
        self.with_retries("getBlockTime", || {
            self.provider.get_block_time(slot)
        })
        .await
    }

    pub async fn fetch_account(
        &self,
        pubkey: &Pubkey,
    ) -> HistoryRpcClientResult<Option<Account>> {
        self.with_retries("getAccountInfo", || {
            self.provider.get_account(pubkey)
        })
        .await
    }

    async fn with_retries<R, F, Fut>(
        &self,
        what: &'static str,
        op: F,
    ) -> HistoryRpcClientResult<R>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<R, ClientError>>,
    {
        let mut attempt = 0;
        loop {
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            match classify(&err) {
                Classification::Unauthorized => {
                    error!("{what}: provider rejected credentials: {err}");
                    return Err(HistoryRpcClientError::Unauthorized(err));
                }
                Classification::Fatal => {
                    error!("{what}: unrecoverable provider response: {err}");
                    return Err(HistoryRpcClientError::ProtocolError(
                        format!("{what}: {err}"),
                    ));
                }
                Classification::Retryable => {
                    if attempt >= self.retry.max_retries {
                        return Err(
                            HistoryRpcClientError::ProviderUnavailable {
                                what,
                                attempts: attempt + 1,
                                source: err,
                            },
                        );
                    }
                    let delay = self.retry.delay(attempt);
                    warn!(
                        "{what} failed (attempt {}), retrying in {:?}: {err}",
                        attempt + 1,
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use solana_rpc_client_api::request::RpcResponseErrorData;

    use super::*;
    use crate::testing::{
        io_error, parse_error, rate_limit_error, signature_record,
        unauthorized_error,
    };

    fn response_error(code: i64) -> ClientError {
        ClientError {
            request: None,
            kind: ClientErrorKind::RpcError(RpcError::RpcResponseError {
                code,
                message: "test".to_string(),
                data: RpcResponseErrorData::Empty,
            }),
        }
    }

    #[test]
    fn test_classify_transient_kinds() {
        assert_eq!(classify(&io_error()), Classification::Retryable);
        assert_eq!(classify(&rate_limit_error()), Classification::Retryable);
        assert_eq!(classify(&response_error(503)), Classification::Retryable);
        // node unhealthy
        assert_eq!(
            classify(&response_error(-32005)),
            Classification::Retryable
        );
    }

    #[test]
    fn test_classify_fatal_kinds() {
        assert_eq!(classify(&parse_error()), Classification::Fatal);
        assert_eq!(
            classify(&unauthorized_error()),
            Classification::Unauthorized
        );
        // invalid params is a programming error, not worth a retry
        assert_eq!(classify(&response_error(-32602)), Classification::Fatal);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let retry = RetryConfig {
            max_retries: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
        };
        assert_eq!(retry.delay(0), Duration::from_millis(100));
        assert_eq!(retry.delay(1), Duration::from_millis(200));
        assert_eq!(retry.delay(2), Duration::from_millis(400));
        assert_eq!(retry.delay(4), Duration::from_secs(1));
        assert_eq!(retry.delay(63), Duration::from_secs(1));
    }

    #[test]
    fn test_page_finality() {
        let full = HistoryPage {
            records: (0..3).map(|slot| signature_record(slot, None)).collect(),
            limit: 3,
        };
        assert!(!full.is_final());
        assert!(full.next_cursor().unwrap().is_some());

        let short = HistoryPage {
            records: vec![signature_record(7, Some(1))],
            limit: 3,
        };
        assert!(short.is_final());

        let empty = HistoryPage {
            records: vec![],
            limit: 3,
        };
        assert!(empty.is_final());
        assert!(empty.next_cursor().unwrap().is_none());
        assert!(empty.oldest().is_none());
    }

    #[test]
    fn test_cursor_rejects_garbage_signature() {
        let mut record = signature_record(1, None);
        record.signature = "not-a-signature".to_string();
        let page = HistoryPage {
            records: vec![record],
            limit: 10,
        };
        assert!(matches!(
            page.next_cursor(),
            Err(HistoryRpcClientError::ProtocolError(_))
        ));
    }
}
