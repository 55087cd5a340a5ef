use solana_sdk::{
    account::Account,
    bpf_loader,
    bpf_loader_upgradeable::{self, UpgradeableLoaderState},
    pubkey::Pubkey,
    system_program,
};

pub use radiocarbon_rpc_client::testing::{
    failed_record, init_logger, io_error, parse_error, rate_limit_error,
    signature_record, synthetic_history, unauthorized_error, ProviderRpcMock,
    ProviderRpcMockBuilder,
};

pub fn upgradeable_program_account(programdata_address: &Pubkey) -> Account {
    let data = bincode::serialize(&UpgradeableLoaderState::Program {
        programdata_address: *programdata_address,
    })
    .expect("loader state serializes");
    Account {
        lamports: 1_141_440,
        data,
        owner: bpf_loader_upgradeable::id(),
        executable: true,
        rent_epoch: 0,
    }
}

pub fn programdata_account() -> Account {
    let data = bincode::serialize(&UpgradeableLoaderState::ProgramData {
        slot: 0,
        upgrade_authority_address: None,
    })
    .expect("loader state serializes");
    Account {
        lamports: 1,
        data,
        owner: bpf_loader_upgradeable::id(),
        executable: false,
        rent_epoch: 0,
    }
}

pub fn buffer_account() -> Account {
    let data = bincode::serialize(&UpgradeableLoaderState::Buffer {
        authority_address: None,
    })
    .expect("loader state serializes");
    Account {
        lamports: 1,
        data,
        owner: bpf_loader_upgradeable::id(),
        executable: false,
        rent_epoch: 0,
    }
}

pub fn legacy_program_account() -> Account {
    Account {
        lamports: 1,
        data: vec![0xde, 0xad, 0xbe, 0xef],
        owner: bpf_loader::id(),
        executable: true,
        rent_epoch: 0,
    }
}

pub fn wallet_account() -> Account {
    Account {
        lamports: 1_000_000,
        data: vec![],
        owner: system_program::id(),
        executable: false,
        rent_epoch: 0,
    }
}
