use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use solana_rpc_client_api::{
    client_error::{Error as ClientError, ErrorKind as ClientErrorKind},
    request::{RpcError, RpcResponseErrorData},
    response::RpcConfirmedTransactionStatusWithSignature,
};
use solana_sdk::{
    account::Account,
    clock::{Slot, UnixTimestamp},
    instruction::InstructionError,
    pubkey::Pubkey,
    signature::Signature,
    transaction::TransactionError,
};

use crate::provider::ProviderRpc;

pub fn init_logger() {
    let _ = env_logger::builder()
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .is_test(true)
        .try_init();
}

// -----------------
// Record fabrication
// -----------------

pub fn signature_record(
    slot: Slot,
    block_time: Option<UnixTimestamp>,
) -> RpcConfirmedTransactionStatusWithSignature {
    RpcConfirmedTransactionStatusWithSignature {
        signature: Signature::new_unique().to_string(),
        slot,
        err: None,
        memo: None,
        block_time,
        confirmation_status: None,
    }
}

/// A record for a transaction that failed on chain. Still valid history.
pub fn failed_record(
    slot: Slot,
    block_time: Option<UnixTimestamp>,
) -> RpcConfirmedTransactionStatusWithSignature {
    let mut record = signature_record(slot, block_time);
    record.err = Some(TransactionError::InstructionError(
        0,
        InstructionError::Custom(0),
    ));
    record
}

/// `n` records, newest first: slots descend from `n` to 1 and each slot
/// `s` carries block time `1_000 + s`.
pub fn synthetic_history(
    n: usize,
) -> Vec<RpcConfirmedTransactionStatusWithSignature> {
    (1..=n as Slot)
        .rev()
        .map(|slot| signature_record(slot, Some(1_000 + slot as UnixTimestamp)))
        .collect()
}

// -----------------
// Error fabrication
// -----------------

pub fn io_error() -> ClientError {
    ClientError {
        request: None,
        kind: ClientErrorKind::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "simulated timeout",
        )),
    }
}

pub fn rate_limit_error() -> ClientError {
    response_code_error(429, "Too Many Requests. Exceeded Rate Limits.")
}

pub fn unauthorized_error() -> ClientError {
    response_code_error(401, "Unauthorized. Invalid API key.")
}

pub fn parse_error() -> ClientError {
    ClientError {
        request: None,
        kind: ClientErrorKind::RpcError(RpcError::ParseError(
            "simulated schema violation".to_string(),
        )),
    }
}

fn response_code_error(code: i64, message: &str) -> ClientError {
    ClientError {
        request: None,
        kind: ClientErrorKind::RpcError(RpcError::RpcResponseError {
            code,
            message: message.to_string(),
            data: RpcResponseErrorData::Empty,
        }),
    }
}

// -----------------
// ProviderRpcMockBuilder
// -----------------

#[derive(Default)]
pub struct ProviderRpcMockBuilder {
    history: HashMap<Pubkey, Vec<RpcConfirmedTransactionStatusWithSignature>>,
    block_times: HashMap<Slot, UnixTimestamp>,
    accounts: HashMap<Pubkey, Account>,
}

impl ProviderRpcMockBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full signature history for `address`, newest first, exactly as the
    /// provider would page it out.
    pub fn history(
        mut self,
        address: Pubkey,
        records: Vec<RpcConfirmedTransactionStatusWithSignature>,
    ) -> Self {
        self.history.insert(address, records);
        self
    }

    pub fn block_time(mut self, slot: Slot, timestamp: UnixTimestamp) -> Self {
        self.block_times.insert(slot, timestamp);
        self
    }

    pub fn account(mut self, pubkey: Pubkey, account: Account) -> Self {
        self.accounts.insert(pubkey, account);
        self
    }

    pub fn build(self) -> ProviderRpcMock {
        ProviderRpcMock {
            inner: Arc::new(MockInner {
                history: Mutex::new(self.history),
                block_times: Mutex::new(self.block_times),
                accounts: Mutex::new(self.accounts),
                signature_failures: Mutex::new(HashMap::new()),
                block_time_failures: Mutex::new(HashMap::new()),
                account_failures: Mutex::new(HashMap::new()),
                signature_calls: AtomicUsize::new(0),
                block_time_calls: AtomicUsize::new(0),
                account_calls: AtomicUsize::new(0),
            }),
        }
    }
}

// -----------------
// ProviderRpcMock
// -----------------

#[derive(Default)]
struct MockInner {
    history: Mutex<HashMap<Pubkey, Vec<RpcConfirmedTransactionStatusWithSignature>>>,
    block_times: Mutex<HashMap<Slot, UnixTimestamp>>,
    accounts: Mutex<HashMap<Pubkey, Account>>,
    /// Failures scripted by 1-based call number, consumed on hit.
    signature_failures: Mutex<HashMap<usize, ClientError>>,
    block_time_failures: Mutex<HashMap<usize, ClientError>>,
    account_failures: Mutex<HashMap<usize, ClientError>>,
    signature_calls: AtomicUsize,
    block_time_calls: AtomicUsize,
    account_calls: AtomicUsize,
}

/// Scripted in-memory provider. Serves pages out of a fixed history the
/// same way the real endpoint does (cursor lookup, bounded limit) and can
/// inject a failure at any given call number, which is how the retry and
/// mid-walk failure paths are exercised.
#[derive(Clone, Default)]
pub struct ProviderRpcMock {
    inner: Arc<MockInner>,
}

impl ProviderRpcMock {
    pub fn fail_signatures_call(&self, nth: usize, err: ClientError) {
        self.inner
            .signature_failures
            .lock()
            .unwrap()
            .insert(nth, err);
    }

    pub fn fail_block_time_call(&self, nth: usize, err: ClientError) {
        self.inner
            .block_time_failures
            .lock()
            .unwrap()
            .insert(nth, err);
    }

    pub fn fail_account_call(&self, nth: usize, err: ClientError) {
        self.inner.account_failures.lock().unwrap().insert(nth, err);
    }

    pub fn signature_calls(&self) -> usize {
        self.inner.signature_calls.load(Ordering::SeqCst)
    }

    pub fn block_time_calls(&self) -> usize {
        self.inner.block_time_calls.load(Ordering::SeqCst)
    }

    pub fn account_calls(&self) -> usize {
        self.inner.account_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.signature_calls() + self.block_time_calls() + self.account_calls()
    }

    fn scripted_failure(
        failures: &Mutex<HashMap<usize, ClientError>>,
        call: usize,
    ) -> Result<(), ClientError> {
        match failures.lock().unwrap().remove(&call) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ProviderRpc for ProviderRpcMock {
    fn url(&self) -> String {
        "mock://provider".to_string()
    }

    async fn get_signatures_for_address(
        &self,
        address: &Pubkey,
        before: Option<Signature>,
        limit: usize,
    ) -> Result<Vec<RpcConfirmedTransactionStatusWithSignature>, ClientError>
    {
        let call =
            self.inner.signature_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Self::scripted_failure(&self.inner.signature_failures, call)?;

        let history = self.inner.history.lock().unwrap();
        let all = history.get(address).cloned().unwrap_or_default();
        let start = match before {
            None => 0,
            Some(cursor) => {
                let cursor = cursor.to_string();
                match all.iter().position(|r| r.signature == cursor) {
                    Some(found) => found + 1,
                    // Unknown cursor: nothing older than it to serve.
                    None => all.len(),
                }
            }
        };
        let end = (start + limit).min(all.len());
        Ok(all[start..end].to_vec())
    }

    async fn get_block_time(
        &self,
        slot: Slot,
    ) -> Result<Option<UnixTimestamp>, ClientError> {
        let call =
            self.inner.block_time_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Self::scripted_failure(&self.inner.block_time_failures, call)?;
        Ok(self.inner.block_times.lock().unwrap().get(&slot).copied())
    }

    async fn get_account(
        &self,
        pubkey: &Pubkey,
    ) -> Result<Option<Account>, ClientError> {
        let call =
            self.inner.account_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Self::scripted_failure(&self.inner.account_failures, call)?;
        Ok(self.inner.accounts.lock().unwrap().get(pubkey).cloned())
    }
}
