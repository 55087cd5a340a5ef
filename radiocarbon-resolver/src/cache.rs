use std::{collections::HashMap, sync::RwLock};

use solana_sdk::pubkey::Pubkey;

use crate::ResolutionResult;

/// Mapping from address to its resolved first activity. Entries never
/// expire: once a block is finalized its timestamp is immutable, so a
/// stored result stays correct until explicitly removed.
///
/// `get` is a pure lookup and must never trigger network activity. `put`
/// is only called after a fully successful walk; a resolution that fails
/// mid-traversal leaves the cache untouched.
pub trait ResolutionCache: Send + Sync {
    fn get(&self, address: &Pubkey) -> Option<ResolutionResult>;

    fn put(&self, address: Pubkey, result: ResolutionResult);

    /// Removes one entry; returns whether it existed.
    fn invalidate(&self, address: &Pubkey) -> bool;

    /// Removes all entries unconditionally. Rarely necessary given that
    /// entries are immutable once finalized.
    fn clear(&self);
}

/// In-memory cache used in tests and by embedders that do not want
/// persistence. Key-level isolation comes from the single lock; writes
/// for the same key are idempotent, so racing resolutions of one address
/// are harmless.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<Pubkey, ResolutionResult>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }
}

impl ResolutionCache for MemoryCache {
    fn get(&self, address: &Pubkey) -> Option<ResolutionResult> {
        self.entries.read().unwrap().get(address).cloned()
    }

    fn put(&self, address: Pubkey, result: ResolutionResult) {
        self.entries.write().unwrap().insert(address, result);
    }

    fn invalidate(&self, address: &Pubkey) -> bool {
        self.entries.write().unwrap().remove(address).is_some()
    }

    fn clear(&self) {
        self.entries.write().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use solana_sdk::signature::Signature;

    use super::*;

    fn result_for(address: Pubkey, block_time: i64) -> ResolutionResult {
        ResolutionResult {
            address,
            signature: Signature::new_unique(),
            slot: 7,
            block_time,
        }
    }

    #[test]
    fn test_put_get_roundtrip() {
        let cache = MemoryCache::new();
        let address = Pubkey::new_unique();
        let result = result_for(address, 1_660_709_269);

        assert!(cache.get(&address).is_none());
        cache.put(address, result.clone());
        assert_eq!(cache.get(&address), Some(result));
    }

    #[test]
    fn test_invalidate_removes_single_entry() {
        let cache = MemoryCache::new();
        let kept = Pubkey::new_unique();
        let dropped = Pubkey::new_unique();
        cache.put(kept, result_for(kept, 1));
        cache.put(dropped, result_for(dropped, 2));

        assert!(cache.invalidate(&dropped));
        assert!(!cache.invalidate(&dropped));
        assert!(cache.get(&dropped).is_none());
        assert!(cache.get(&kept).is_some());
    }

    #[test]
    fn test_clear_empties_everything() {
        let cache = MemoryCache::new();
        for _ in 0..4 {
            let address = Pubkey::new_unique();
            cache.put(address, result_for(address, 3));
        }
        assert_eq!(cache.len(), 4);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_same_key_write_is_idempotent() {
        let cache = MemoryCache::new();
        let address = Pubkey::new_unique();
        let result = result_for(address, 5);

        cache.put(address, result.clone());
        cache.put(address, result.clone());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&address), Some(result));
    }
}
