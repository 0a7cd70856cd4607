// multisig_program: instruction dispatch for the M-of-N multisig.

pub mod approve;
pub mod create_multisig;
pub mod create_transaction;
pub mod delegate;
pub mod execute;
pub mod set_owners;

#[cfg(test)]
mod test_utils;

use ledger_core::{Program, ProgramError, ProgramResult, program_id_from_name};
use nssa_core::account::AccountWithMetadata;
use nssa_core::program::{AccountPostState, ProgramId};
use multisig_core::Instruction;

pub struct MultisigProgram {
    id: ProgramId,
}

impl MultisigProgram {
    pub const NAME: &'static str = "multisig";

    pub fn new() -> Self {
        Self::with_id(program_id_from_name(Self::NAME))
    }

    pub fn with_id(id: ProgramId) -> Self {
        Self { id }
    }
}

impl Default for MultisigProgram {
    fn default() -> Self {
        Self::new()
    }
}

impl Program for MultisigProgram {
    fn id(&self) -> ProgramId {
        self.id
    }

    fn execute(&self, pre_states: &[AccountWithMetadata], instruction_data: &[u8]) -> ProgramResult {
        let instruction: Instruction =
            borsh::from_slice(instruction_data).map_err(|_| ProgramError::InvalidInstructionData)?;
        process(&self.id, pre_states, &instruction)
    }
}

/// Route a decoded instruction to its handler.
pub fn process(
    program_id: &ProgramId,
    accounts: &[AccountWithMetadata],
    instruction: &Instruction,
) -> ProgramResult {
    match instruction {
        Instruction::CreateMultisig {
            create_key,
            owners,
            threshold,
        } => create_multisig::handle(program_id, accounts, create_key, owners, *threshold),

        Instruction::CreateTransaction { create_key, action } => {
            create_transaction::handle(program_id, accounts, create_key, action)
        }

        Instruction::Approve => approve::handle(program_id, accounts),

        Instruction::DelegateApprove => delegate::handle_approve(program_id, accounts),

        Instruction::ExecuteTransaction => execute::handle(program_id, accounts),

        Instruction::SetOwners { owners } => set_owners::handle_set_owners(program_id, accounts, owners),

        Instruction::ChangeThreshold { threshold } => {
            set_owners::handle_change_threshold(program_id, accounts, *threshold)
        }

        Instruction::SetOwnersAndChangeThreshold { owners, threshold } => {
            set_owners::handle_set_owners_and_change_threshold(
                program_id, accounts, owners, *threshold,
            )
        }

        Instruction::CreateDelegateList { delegates } => {
            delegate::handle_create(program_id, accounts, delegates)
        }

        Instruction::SetDelegateList { delegates } => {
            delegate::handle_set(program_id, accounts, delegates)
        }
    }
}

/// Post states that leave every account untouched.
pub(crate) fn unchanged(accounts: &[AccountWithMetadata]) -> Vec<AccountPostState> {
    accounts
        .iter()
        .map(|a| AccountPostState::new(a.account.clone()))
        .collect()
}
