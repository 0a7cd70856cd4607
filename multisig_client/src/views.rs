// multisig_client::views: serialisable summaries for show-multisig and
// show-transaction.

use ledger_core::display_program_id;
use nssa_core::account::AccountId;
use nssa_core::program::ProgramId;
use loader_core::Instruction as LoaderInstruction;
use multisig_core::{Instruction, SignersView, TransactionAction};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigView {
    pub address: AccountId,
    pub owners: Vec<AccountId>,
    pub threshold: u64,
    pub derived_authority: AccountId,
    pub owner_set_seqno: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionView {
    pub address: AccountId,
    pub multisig: AccountId,
    pub proposer: AccountId,
    pub parsed_instruction: InstructionView,
    pub did_execute: bool,
    pub signers: SignersView,
}

/// A transaction's action, decoded when it is one the client recognises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstructionView {
    LoaderUpgrade {
        program_to_upgrade: AccountId,
        program_data_address: AccountId,
        buffer_address: AccountId,
        spill_address: AccountId,
    },
    SetUpgradeAuthority {
        account: AccountId,
        current_authority: AccountId,
        new_authority: Option<AccountId>,
    },
    SetOwners {
        owners: Vec<AccountId>,
    },
    ChangeThreshold {
        threshold: u64,
    },
    SetOwnersAndChangeThreshold {
        owners: Vec<AccountId>,
        threshold: u64,
    },
    Raw {
        program_id: String,
        accounts: Vec<AccountId>,
        data: String,
    },
}

impl InstructionView {
    pub fn parse(action: &TransactionAction, multisig_id: &ProgramId, loader_id: &ProgramId) -> Self {
        if action.program_id == *loader_id {
            if let Some(view) = parse_loader(action) {
                return view;
            }
        }
        match action.multisig_instruction(multisig_id) {
            Some(Instruction::SetOwners { owners }) => InstructionView::SetOwners { owners },
            Some(Instruction::ChangeThreshold { threshold }) => {
                InstructionView::ChangeThreshold { threshold }
            }
            Some(Instruction::SetOwnersAndChangeThreshold { owners, threshold }) => {
                InstructionView::SetOwnersAndChangeThreshold { owners, threshold }
            }
            _ => InstructionView::Raw {
                program_id: display_program_id(&action.program_id),
                accounts: action.accounts.clone(),
                data: hex::encode(&action.data),
            },
        }
    }
}

fn parse_loader(action: &TransactionAction) -> Option<InstructionView> {
    let instruction: LoaderInstruction = borsh::from_slice(&action.data).ok()?;
    match (instruction, action.accounts.as_slice()) {
        (LoaderInstruction::Upgrade, [program_data, program, buffer, spill, ..]) => {
            Some(InstructionView::LoaderUpgrade {
                program_to_upgrade: *program,
                program_data_address: *program_data,
                buffer_address: *buffer,
                spill_address: *spill,
            })
        }
        (LoaderInstruction::SetAuthority { new_authority }, [account, current, ..]) => {
            Some(InstructionView::SetUpgradeAuthority {
                account: *account,
                current_authority: *current,
                new_authority,
            })
        }
        _ => None,
    }
}
