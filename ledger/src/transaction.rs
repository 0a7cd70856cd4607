use borsh::BorshSerialize;
use ledger_core::PublicKey;
use nssa_core::account::AccountId;
use nssa_core::program::ProgramId;

use crate::error::LedgerError;

/// A single top-level instruction submitted to the ledger.
///
/// Every account whose id is derived from one of `signers` is handed to the
/// program as authorized.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub program_id: ProgramId,
    pub account_ids: Vec<AccountId>,
    pub signers: Vec<PublicKey>,
    pub instruction_data: Vec<u8>,
}

impl Transaction {
    pub fn try_new<I: BorshSerialize>(
        program_id: ProgramId,
        account_ids: Vec<AccountId>,
        signers: Vec<PublicKey>,
        instruction: &I,
    ) -> Result<Self, LedgerError> {
        Ok(Self {
            program_id,
            account_ids,
            signers,
            instruction_data: borsh::to_vec(instruction)?,
        })
    }
}
