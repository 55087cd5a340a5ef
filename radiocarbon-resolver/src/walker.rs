use log::*;
use radiocarbon_rpc_client::{
    parse_signature, HistoryRpcClient, ProviderRpc, MAX_SIGNATURE_PAGE_LIMIT,
};
use solana_sdk::{
    clock::{Slot, UnixTimestamp},
    pubkey::Pubkey,
    signature::Signature,
};

use crate::{ResolverError, ResolverResult};

/// The earliest known activity for an address, as determined by a full
/// backward walk of its signature history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EarliestActivity {
    pub signature: Signature,
    pub slot: Slot,
    pub block_time: UnixTimestamp,
}

/// Walks an address's signature history back to its first entry.
///
/// The provider only exposes reverse-chronological pagination with no
/// seek-to-oldest primitive, so the exhaustive backward walk is the only
/// correct strategy: O(history length / page size) sequential page
/// requests. There is no shortcut; without a monotonic key exposed by the
/// provider no binary search is possible.
pub struct HistoryWalker<T: ProviderRpc> {
    client: HistoryRpcClient<T>,
    page_limit: usize,
}

impl<T: ProviderRpc> HistoryWalker<T> {
    pub fn new(client: HistoryRpcClient<T>) -> Self {
        Self::with_page_limit(client, MAX_SIGNATURE_PAGE_LIMIT)
    }

    pub fn with_page_limit(
        client: HistoryRpcClient<T>,
        page_limit: usize,
    ) -> Self {
        Self { client, page_limit }
    }

    /// Pages backward until the history is exhausted and returns the
    /// oldest record. A history of N signatures at page size P costs
    /// exactly ⌈(N+1)/P⌉ page requests: full pages keep the walk going
    /// and either a short page or an empty continuation terminates it.
    pub async fn find_earliest_signature(
        &self,
        address: &Pubkey,
    ) -> ResolverResult<EarliestActivity> {
        debug!("walking signature history of {address}");

        let mut before: Option<Signature> = None;
        let mut oldest = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .client
                .fetch_history_page(address, before, self.page_limit)
                .await?;
            pages += 1;
            trace!(
                "page {pages}: {} record(s), final: {}",
                page.len(),
                page.is_final()
            );

            let Some(last) = page.oldest() else {
                break;
            };
            // Page position is authoritative for recency. Several records
            // can share a slot, so the last entry wins, not the lowest
            // slot number.
            oldest = Some(last.clone());
            if page.is_final() {
                break;
            }
            before = page.next_cursor()?;
        }

        let record = oldest
            .ok_or(ResolverError::NoHistoryFound(*address))?;
        debug!(
            "earliest signature for {address} after {pages} page(s): \
             {} (slot {})",
            record.signature, record.slot
        );
        if record.err.is_some() {
            // A reverted transaction still marks first activity.
            debug!("earliest transaction failed on chain; counting it");
        }

        let signature = parse_signature(&record.signature)?;
        let block_time = match record.block_time {
            Some(block_time) => block_time,
            None => {
                debug!(
                    "record {signature} carries no block time, re-fetching \
                     for slot {}",
                    record.slot
                );
                self.client.fetch_block_time(record.slot).await?.ok_or(
                    ResolverError::TimestampUnavailable {
                        signature,
                        slot: record.slot,
                    },
                )?
            }
        };

        Ok(EarliestActivity {
            signature,
            slot: record.slot,
            block_time,
        })
    }
}
