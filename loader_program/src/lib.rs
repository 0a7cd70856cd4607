// loader_program: the upgradeable program loader.

pub mod initialize_buffer;
pub mod set_authority;
pub mod upgrade;

use ledger_core::{Program, ProgramError, ProgramResult, account_data, program_id_from_name};
use loader_core::{Instruction, LoaderState};
use nssa_core::account::AccountWithMetadata;
use nssa_core::program::{AccountPostState, ProgramId};

pub struct LoaderProgram {
    id: ProgramId,
}

impl LoaderProgram {
    pub const NAME: &'static str = "upgradeable_loader";

    pub fn new() -> Self {
        Self {
            id: program_id_from_name(Self::NAME),
        }
    }
}

impl Default for LoaderProgram {
    fn default() -> Self {
        Self::new()
    }
}

impl Program for LoaderProgram {
    fn id(&self) -> ProgramId {
        self.id
    }

    fn execute(
        &self,
        pre_states: &[AccountWithMetadata],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction: Instruction =
            borsh::from_slice(instruction_data).map_err(|_| ProgramError::InvalidInstructionData)?;
        match instruction {
            Instruction::InitializeBuffer { code } => {
                initialize_buffer::handle(&self.id, pre_states, code)
            }
            Instruction::Upgrade => upgrade::handle(&self.id, pre_states),
            Instruction::SetAuthority { new_authority } => {
                set_authority::handle(&self.id, pre_states, new_authority)
            }
        }
    }
}

/// Loader state of an account, if the loader owns it.
pub(crate) fn loader_state(account: &AccountWithMetadata, loader_id: &ProgramId) -> Option<LoaderState> {
    if account.account.program_owner != *loader_id {
        return None;
    }
    borsh::from_slice(&account_data(&account.account)).ok()
}

pub(crate) fn unchanged(accounts: &[AccountWithMetadata]) -> Vec<AccountPostState> {
    accounts
        .iter()
        .map(|a| AccountPostState::new(a.account.clone()))
        .collect()
}
