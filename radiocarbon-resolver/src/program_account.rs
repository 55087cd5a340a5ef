use log::*;
use solana_sdk::{
    account::Account,
    bpf_loader_upgradeable::{self, UpgradeableLoaderState},
    pubkey::Pubkey,
};

use crate::{ResolverError, ResolverResult};

/// Which address the walker should page through for a given program
/// account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum WalkTarget {
    Direct(Pubkey),
    /// Upgradeable programs keep their deployment history on the
    /// programdata account, which sees far fewer transactions than the
    /// program address itself. The program address remains the fallback
    /// in case the programdata history is empty.
    ProgramDataWithFallback {
        program: Pubkey,
        programdata: Pubkey,
    },
}

pub(crate) fn walk_target(
    address: &Pubkey,
    account: &Account,
) -> ResolverResult<WalkTarget> {
    if account.owner == bpf_loader_upgradeable::id() {
        return upgradeable_walk_target(address, account);
    }

    if !account.executable {
        return Err(ResolverError::NotAProgramAccount(*address));
    }

    warn!(
        "{address} uses a legacy loader; expect degraded performance \
         (full history walk of the program address)"
    );
    Ok(WalkTarget::Direct(*address))
}

fn upgradeable_walk_target(
    address: &Pubkey,
    account: &Account,
) -> ResolverResult<WalkTarget> {
    let state =
        bincode::deserialize::<UpgradeableLoaderState>(&account.data)
            .map_err(|err| {
                warn!("{address}: undecodable loader state: {err}");
                ResolverError::UnsupportedProgramState(*address)
            })?;

    match state {
        UpgradeableLoaderState::Program {
            programdata_address,
        } => Ok(WalkTarget::ProgramDataWithFallback {
            program: *address,
            programdata: programdata_address,
        }),
        UpgradeableLoaderState::ProgramData { .. } => {
            Ok(WalkTarget::Direct(*address))
        }
        UpgradeableLoaderState::Buffer { .. }
        | UpgradeableLoaderState::Uninitialized => {
            Err(ResolverError::UnsupportedProgramState(*address))
        }
    }
}
