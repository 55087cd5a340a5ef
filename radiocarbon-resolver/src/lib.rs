use serde::{Deserialize, Serialize};
use solana_sdk::{
    clock::{Slot, UnixTimestamp},
    pubkey::Pubkey,
    signature::Signature,
};

pub mod cache;
mod errors;
mod program_account;
pub mod resolver;
#[cfg(any(test, feature = "dev-context"))]
pub mod testing;
pub mod walker;

pub use errors::{ResolverError, ResolverResult};
pub use resolver::{ResolveOptions, Resolver};

/// The outcome of one successful resolution: the earliest known on-chain
/// activity for an address. Immutable once computed; finalized block
/// times never change, so cached copies stay valid forever.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    #[serde(with = "pubkey_string")]
    pub address: Pubkey,
    /// Signature of the earliest transaction touching the address.
    #[serde(with = "signature_string")]
    pub signature: Signature,
    pub slot: Slot,
    pub block_time: UnixTimestamp,
}

mod pubkey_string {
    use serde::{Deserialize, Deserializer, Serializer};
    use solana_sdk::pubkey::Pubkey;

    pub fn serialize<S: Serializer>(
        pubkey: &Pubkey,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&pubkey.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Pubkey, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

mod signature_string {
    use serde::{Deserialize, Deserializer, Serializer};
    use solana_sdk::signature::Signature;

    pub fn serialize<S: Serializer>(
        signature: &Signature,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&signature.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Signature, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_result_serializes_base58() {
        let result = ResolutionResult {
            address: Pubkey::new_unique(),
            signature: Signature::new_unique(),
            slot: 42,
            block_time: 1_660_709_269,
        };

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains(&result.address.to_string()));
        assert!(json.contains(&result.signature.to_string()));

        let back: ResolutionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
