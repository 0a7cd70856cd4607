// loader_core: shared types for the upgradeable program loader.
//
// A program is two accounts: the program account, which points at its program
// data, and the program data account (a PDA of the program address) holding
// the code and the upgrade authority. New code is staged in a buffer account
// and swapped in by `Upgrade`, signed by the upgrade authority.

pub mod error;

use borsh::{BorshDeserialize, BorshSerialize};
use nssa_core::account::{Account, AccountId};
use nssa_core::program::{PdaSeed, ProgramId};
use sha2::{Digest, Sha256};

pub use error::LoaderError;

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum Instruction {
    /// Stage code for a later upgrade.
    ///
    /// Accounts:
    /// 0. `buffer`: signer, uninitialized
    /// 1. `authority`: becomes the buffer authority
    InitializeBuffer { code: Vec<u8> },

    /// Replace a program's code with the contents of a buffer.
    ///
    /// Accounts:
    /// 0. `program_data`
    /// 1. `program`
    /// 2. `buffer`: emptied; its balance goes to `spill`
    /// 3. `spill`
    /// 4. `authority`: signer; upgrade authority and buffer authority
    Upgrade,

    /// Change or remove the authority of a program data or buffer account.
    /// `None` makes the account immutable.
    ///
    /// Accounts:
    /// 0. `program_data` or `buffer`
    /// 1. `current_authority`: signer
    SetAuthority { new_authority: Option<AccountId> },
}

// ---------------------------------------------------------------------------
// Account state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum LoaderState {
    Buffer {
        authority: Option<AccountId>,
        code: Vec<u8>,
    },
    Program {
        program_data: AccountId,
    },
    ProgramData {
        upgrade_authority: Option<AccountId>,
        code: Vec<u8>,
    },
}

// ---------------------------------------------------------------------------
// PDA derivation
// ---------------------------------------------------------------------------

const PROGRAM_DATA_TAG: &[u8] = b"loader_program_data";

pub fn program_data_pda_seed(program: &AccountId) -> PdaSeed {
    let digest: [u8; 32] = Sha256::new()
        .chain_update(PROGRAM_DATA_TAG)
        .chain_update(program.value())
        .finalize()
        .into();
    PdaSeed::new(digest)
}

pub fn compute_program_data_pda(loader_id: &ProgramId, program: &AccountId) -> AccountId {
    AccountId::from((loader_id, &program_data_pda_seed(program)))
}

/// Program and program data accounts for a program deployed at genesis.
pub fn genesis_program(
    loader_id: &ProgramId,
    program: AccountId,
    upgrade_authority: Option<AccountId>,
    code: Vec<u8>,
) -> std::io::Result<[(AccountId, Account); 2]> {
    let program_data = compute_program_data_pda(loader_id, &program);
    let program_account = loader_account(loader_id, &LoaderState::Program { program_data })?;
    let program_data_account = loader_account(
        loader_id,
        &LoaderState::ProgramData {
            upgrade_authority,
            code,
        },
    )?;
    Ok([(program, program_account), (program_data, program_data_account)])
}

fn loader_account(loader_id: &ProgramId, state: &LoaderState) -> std::io::Result<Account> {
    let mut account = Account::default();
    account.program_owner = *loader_id;
    account.data = borsh::to_vec(state)?
        .try_into()
        .map_err(|_| std::io::Error::other("loader state exceeds account data limit"))?;
    Ok(account)
}
