use std::{collections::HashMap, fs, path::PathBuf, sync::RwLock};

use log::*;
use radiocarbon_resolver::{cache::ResolutionCache, ResolutionResult};
use solana_sdk::pubkey::Pubkey;

/// JSON-file-backed resolution cache, one file per network. The file is
/// read once at construction and written through on every mutation;
/// results are finalized history, so a stale read can never serve a
/// wrong timestamp, only a missing one.
pub struct FileCache {
    path: PathBuf,
    entries: RwLock<HashMap<Pubkey, ResolutionResult>>,
}

impl FileCache {
    /// A missing or corrupt cache file is not an error; the cache just
    /// starts out empty.
    pub fn load(path: PathBuf) -> Self {
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Vec<ResolutionResult>>(
                &raw,
            ) {
                Ok(results) => results
                    .into_iter()
                    .map(|result| (result.address, result))
                    .collect(),
                Err(err) => {
                    warn!(
                        "cache file {} is corrupt, starting empty: {err}",
                        path.display()
                    );
                    HashMap::new()
                }
            },
            Err(_) => {
                debug!(
                    "no existing cache file at {}, starting empty",
                    path.display()
                );
                HashMap::new()
            }
        };
        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }

    fn persist(&self, entries: &HashMap<Pubkey, ResolutionResult>) {
        let mut results: Vec<&ResolutionResult> = entries.values().collect();
        results.sort_by_key(|result| result.address);

        let rendered = match serde_json::to_string_pretty(&results) {
            Ok(rendered) => rendered,
            Err(err) => {
                warn!("failed to serialize cache entries: {err}");
                return;
            }
        };
        if let Some(parent) = self.path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                warn!(
                    "failed to create cache directory {}: {err}",
                    parent.display()
                );
                return;
            }
        }
        if let Err(err) = fs::write(&self.path, rendered) {
            warn!(
                "error saving to persistent cache {}: {err}",
                self.path.display()
            );
        }
    }
}

impl ResolutionCache for FileCache {
    fn get(&self, address: &Pubkey) -> Option<ResolutionResult> {
        self.entries.read().unwrap().get(address).cloned()
    }

    fn put(&self, address: Pubkey, result: ResolutionResult) {
        let mut entries = self.entries.write().unwrap();
        entries.insert(address, result);
        self.persist(&entries);
    }

    fn invalidate(&self, address: &Pubkey) -> bool {
        let mut entries = self.entries.write().unwrap();
        let removed = entries.remove(address).is_some();
        if removed {
            self.persist(&entries);
        }
        removed
    }

    fn clear(&self) {
        let mut entries = self.entries.write().unwrap();
        entries.clear();
        self.persist(&entries);
    }
}

#[cfg(test)]
mod tests {
    use solana_sdk::signature::Signature;

    use super::*;

    fn result_for(address: Pubkey) -> ResolutionResult {
        ResolutionResult {
            address,
            signature: Signature::new_unique(),
            slot: 42,
            block_time: 1_660_709_269,
        }
    }

    #[test]
    fn test_roundtrip_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache-mainnet.json");
        let address = Pubkey::new_unique();
        let result = result_for(address);

        let cache = FileCache::load(path.clone());
        cache.put(address, result.clone());
        drop(cache);

        let reloaded = FileCache::load(path);
        assert_eq!(reloaded.get(&address), Some(result));
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache-mainnet.json");
        fs::write(&path, "{ this is not json ]").unwrap();

        let cache = FileCache::load(path);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache-mainnet.json");

        let cache = FileCache::load(path.clone());
        for _ in 0..3 {
            let address = Pubkey::new_unique();
            cache.put(address, result_for(address));
        }
        cache.clear();
        drop(cache);

        assert!(FileCache::load(path).is_empty());
    }

    #[test]
    fn test_invalidate_persists_removal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache-mainnet.json");
        let kept = Pubkey::new_unique();
        let dropped = Pubkey::new_unique();

        let cache = FileCache::load(path.clone());
        cache.put(kept, result_for(kept));
        cache.put(dropped, result_for(dropped));
        assert!(cache.invalidate(&dropped));
        assert!(!cache.invalidate(&dropped));
        drop(cache);

        let reloaded = FileCache::load(path);
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.get(&kept).is_some());
        assert!(reloaded.get(&dropped).is_none());
    }

    #[test]
    fn test_missing_parent_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep").join("cache-devnet.json");
        let address = Pubkey::new_unique();

        let cache = FileCache::load(path.clone());
        cache.put(address, result_for(address));

        assert!(path.exists());
    }
}
