//! multisig_client: the calling layer for the multisig program.
//!
//! Builds instructions, submits them to a [`Ledger`], decodes program errors
//! into [`ClientError`] and renders account state as serialisable views.

pub mod error;
pub mod views;

use borsh::{BorshDeserialize, BorshSerialize};
use ledger::{Ledger, LedgerError, Transaction};
use ledger_core::{ProgramError, PublicKey, account_data};
use nssa_core::account::AccountId;
use nssa_core::program::ProgramId;
use loader_core::{Instruction as LoaderInstruction, compute_program_data_pda};
use multisig_core::{
    DerivedAuthority, Instruction, MultisigError, MultisigState, SignersView, TransactionAction,
    TransactionState, compute_delegate_list_pda, compute_multisig_pda, compute_transaction_pda,
};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

pub use error::ClientError;
pub use views::{InstructionView, MultisigView, TransactionView};

/// Addresses of a freshly created multisig.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedMultisig {
    pub multisig: AccountId,
    pub derived_authority: AccountId,
}

pub struct MultisigClient<'a> {
    ledger: &'a mut Ledger,
    program_id: ProgramId,
    loader_id: ProgramId,
}

impl<'a> MultisigClient<'a> {
    pub fn new(ledger: &'a mut Ledger, program_id: ProgramId, loader_id: ProgramId) -> Self {
        Self {
            ledger,
            program_id,
            loader_id,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &*self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut *self.ledger
    }

    pub fn program_id(&self) -> ProgramId {
        self.program_id
    }

    pub fn derived_authority(&self, multisig: &AccountId) -> AccountId {
        DerivedAuthority::new(&self.program_id, multisig).address()
    }

    // -----------------------------------------------------------------------
    // Multisig lifecycle
    // -----------------------------------------------------------------------

    pub fn create_multisig(
        &mut self,
        owners: Vec<AccountId>,
        threshold: u64,
    ) -> Result<CreatedMultisig, ClientError> {
        let program_id = self.program_id;
        let create_key = self.fresh_key(b"multisig", &[0u8; 32], |key| {
            compute_multisig_pda(&program_id, key)
        });
        self.create_multisig_with_key(create_key, owners, threshold)
    }

    pub fn create_multisig_with_key(
        &mut self,
        create_key: [u8; 32],
        owners: Vec<AccountId>,
        threshold: u64,
    ) -> Result<CreatedMultisig, ClientError> {
        let multisig = compute_multisig_pda(&self.program_id, &create_key);
        self.submit_multisig(
            vec![multisig],
            vec![],
            &Instruction::CreateMultisig {
                create_key,
                owners,
                threshold,
            },
        )?;
        Ok(CreatedMultisig {
            multisig,
            derived_authority: self.derived_authority(&multisig),
        })
    }

    /// Propose `action`; returns the new transaction's address.
    pub fn propose_action(
        &mut self,
        multisig: &AccountId,
        action: TransactionAction,
        proposer: &PublicKey,
    ) -> Result<AccountId, ClientError> {
        self.propose(multisig, action, proposer, None)
    }

    /// Propose as a delegate of `owner`.
    pub fn propose_action_as_delegate(
        &mut self,
        multisig: &AccountId,
        action: TransactionAction,
        delegate: &PublicKey,
        owner: &AccountId,
    ) -> Result<AccountId, ClientError> {
        let list = compute_delegate_list_pda(&self.program_id, multisig, owner);
        self.propose(multisig, action, delegate, Some(list))
    }

    pub fn propose_owner_set_change(
        &mut self,
        multisig: &AccountId,
        owners: Vec<AccountId>,
        threshold: u64,
        proposer: &PublicKey,
    ) -> Result<AccountId, ClientError> {
        let action = TransactionAction::owner_set_change(&self.program_id, multisig, owners, threshold)?;
        self.propose_action(multisig, action, proposer)
    }

    /// Propose upgrading `program` with the code staged in `buffer`.
    pub fn propose_upgrade(
        &mut self,
        multisig: &AccountId,
        program: &AccountId,
        buffer: &AccountId,
        spill: &AccountId,
        proposer: &PublicKey,
    ) -> Result<AccountId, ClientError> {
        let program_data = compute_program_data_pda(&self.loader_id, program);
        let action = TransactionAction::new(
            self.loader_id,
            vec![
                program_data,
                *program,
                *buffer,
                *spill,
                self.derived_authority(multisig),
            ],
            &LoaderInstruction::Upgrade,
        )?;
        self.propose_action(multisig, action, proposer)
    }

    /// Propose handing the upgrade authority of `program` to `new_authority`.
    pub fn propose_set_upgrade_authority(
        &mut self,
        multisig: &AccountId,
        program: &AccountId,
        new_authority: Option<AccountId>,
        proposer: &PublicKey,
    ) -> Result<AccountId, ClientError> {
        let program_data = compute_program_data_pda(&self.loader_id, program);
        let action = TransactionAction::new(
            self.loader_id,
            vec![program_data, self.derived_authority(multisig)],
            &LoaderInstruction::SetAuthority { new_authority },
        )?;
        self.propose_action(multisig, action, proposer)
    }

    /// Address the next proposal on `multisig` will be stored at.
    pub fn next_transaction_address(&self, multisig: &AccountId) -> AccountId {
        compute_transaction_pda(&self.program_id, multisig, &self.transaction_key(multisig))
    }

    pub fn approve(&mut self, transaction: &AccountId, approver: &PublicKey) -> Result<(), ClientError> {
        let multisig = self.transaction_state(transaction)?.multisig;
        self.submit_multisig(
            vec![multisig, approver.account_id(), *transaction],
            vec![*approver],
            &Instruction::Approve,
        )
    }

    pub fn delegate_approve(
        &mut self,
        transaction: &AccountId,
        delegate: &PublicKey,
        owner: &AccountId,
    ) -> Result<(), ClientError> {
        let multisig = self.transaction_state(transaction)?.multisig;
        let list = compute_delegate_list_pda(&self.program_id, &multisig, owner);
        self.submit_multisig(
            vec![multisig, delegate.account_id(), *transaction, list],
            vec![*delegate],
            &Instruction::DelegateApprove,
        )
    }

    /// Execute an approved transaction. A failure inside the chained action
    /// call is reported as [`ClientError::ExternalActionFailed`]; failures of
    /// the execute call itself keep their multisig or ledger error.
    pub fn execute(&mut self, transaction: &AccountId, executor: &PublicKey) -> Result<(), ClientError> {
        let state = self.transaction_state(transaction)?;
        let multisig = state.multisig;

        let mut account_ids = vec![multisig, self.derived_authority(&multisig), *transaction];
        for id in &state.action.accounts {
            if !account_ids.contains(id) {
                account_ids.push(*id);
            }
        }

        let tx = Transaction::try_new(
            self.program_id,
            account_ids,
            vec![*executor],
            &Instruction::ExecuteTransaction,
        )
        .map_err(ClientError::Ledger)?;
        match self.ledger.submit(&tx) {
            Ok(()) => {
                info!(%transaction, "transaction executed");
                Ok(())
            }
            Err(error) if error.is_chained() => Err(ClientError::ExternalActionFailed(error)),
            Err(error) => Err(self.decode_error(error)),
        }
    }

    // -----------------------------------------------------------------------
    // Delegates
    // -----------------------------------------------------------------------

    pub fn create_delegate_list(
        &mut self,
        multisig: &AccountId,
        owner: &PublicKey,
        delegates: Vec<AccountId>,
    ) -> Result<AccountId, ClientError> {
        let list = compute_delegate_list_pda(&self.program_id, multisig, &owner.account_id());
        self.submit_multisig(
            vec![*multisig, owner.account_id(), list],
            vec![*owner],
            &Instruction::CreateDelegateList { delegates },
        )?;
        Ok(list)
    }

    /// Replace the delegates of `list_owner`, signed by the list's owner.
    pub fn set_delegate_list(
        &mut self,
        multisig: &AccountId,
        list_owner: &PublicKey,
        delegates: Vec<AccountId>,
    ) -> Result<(), ClientError> {
        let list = compute_delegate_list_pda(&self.program_id, multisig, &list_owner.account_id());
        self.submit_multisig(
            vec![*multisig, list_owner.account_id(), list],
            vec![*list_owner],
            &Instruction::SetDelegateList { delegates },
        )
    }

    // -----------------------------------------------------------------------
    // Loader
    // -----------------------------------------------------------------------

    /// Stage `code` in the `buffer` account, governed by `authority`.
    pub fn initialize_buffer(
        &mut self,
        buffer: &PublicKey,
        authority: &AccountId,
        code: Vec<u8>,
    ) -> Result<AccountId, ClientError> {
        let buffer_id = buffer.account_id();
        let tx = Transaction::try_new(
            self.loader_id,
            vec![buffer_id, *authority],
            vec![*buffer],
            &LoaderInstruction::InitializeBuffer { code },
        )
        .map_err(ClientError::Ledger)?;
        self.ledger.submit(&tx).map_err(ClientError::Ledger)?;
        Ok(buffer_id)
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    pub fn multisig_state(&self, multisig: &AccountId) -> Result<MultisigState, ClientError> {
        self.read(multisig)
    }

    pub fn transaction_state(&self, transaction: &AccountId) -> Result<TransactionState, ClientError> {
        self.read(transaction)
    }

    pub fn show_multisig(&self, multisig: &AccountId) -> Result<MultisigView, ClientError> {
        let state = self.multisig_state(multisig)?;
        Ok(MultisigView {
            address: *multisig,
            owners: state.owners,
            threshold: state.threshold,
            derived_authority: self.derived_authority(multisig),
            owner_set_seqno: state.owner_set_seqno,
        })
    }

    pub fn show_transaction(&self, transaction: &AccountId) -> Result<TransactionView, ClientError> {
        let state = self.transaction_state(transaction)?;
        let multisig = self.multisig_state(&state.multisig)?;
        Ok(TransactionView {
            address: *transaction,
            multisig: state.multisig,
            proposer: state.proposer,
            parsed_instruction: InstructionView::parse(&state.action, &self.program_id, &self.loader_id),
            did_execute: state.did_execute,
            signers: SignersView::new(&state, &multisig),
        })
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn propose(
        &mut self,
        multisig: &AccountId,
        action: TransactionAction,
        proposer: &PublicKey,
        delegate_list: Option<AccountId>,
    ) -> Result<AccountId, ClientError> {
        let create_key = self.transaction_key(multisig);
        let transaction = compute_transaction_pda(&self.program_id, multisig, &create_key);

        let mut account_ids = vec![*multisig, proposer.account_id(), transaction];
        account_ids.extend(delegate_list);
        self.submit_multisig(
            account_ids,
            vec![*proposer],
            &Instruction::CreateTransaction { create_key, action },
        )?;
        Ok(transaction)
    }

    fn transaction_key(&self, multisig: &AccountId) -> [u8; 32] {
        let program_id = self.program_id;
        self.fresh_key(b"transaction", multisig.value(), |key| {
            compute_transaction_pda(&program_id, multisig, key)
        })
    }

    /// First key, in a deterministic sequence, whose derived address is unused.
    fn fresh_key(
        &self,
        domain: &[u8],
        scope: &[u8; 32],
        derive: impl Fn(&[u8; 32]) -> AccountId,
    ) -> [u8; 32] {
        let mut nonce = 0u64;
        loop {
            let key: [u8; 32] = Sha256::new()
                .chain_update(domain)
                .chain_update(scope)
                .chain_update(nonce.to_le_bytes())
                .finalize()
                .into();
            if self.ledger.get_account(&derive(&key)).is_none() {
                return key;
            }
            nonce += 1;
        }
    }

    fn submit_multisig<I: BorshSerialize>(
        &mut self,
        account_ids: Vec<AccountId>,
        signers: Vec<PublicKey>,
        instruction: &I,
    ) -> Result<(), ClientError> {
        let tx = Transaction::try_new(self.program_id, account_ids, signers, instruction)
            .map_err(ClientError::Ledger)?;
        debug!(accounts = tx.account_ids.len(), "submitting multisig instruction");
        self.ledger.submit(&tx).map_err(|e| self.decode_error(e))
    }

    /// Errors raised by the multisig program itself become
    /// [`ClientError::Multisig`]; everything else stays a ledger error.
    fn decode_error(&self, error: LedgerError) -> ClientError {
        let code = match &error {
            LedgerError::Program {
                program_id,
                depth: 0,
                error: ProgramError::Custom(code),
            } if *program_id == self.program_id => Some(*code),
            _ => None,
        };
        match code.and_then(MultisigError::from_code) {
            Some(e) => ClientError::Multisig(e),
            None => ClientError::Ledger(error),
        }
    }

    fn read<T: BorshDeserialize>(&self, id: &AccountId) -> Result<T, ClientError> {
        let account = self
            .ledger
            .get_account(id)
            .ok_or(ClientError::AccountNotFound(*id))?;
        if account.program_owner != self.program_id {
            return Err(ClientError::InvalidAccountData(*id));
        }
        borsh::from_slice(&account_data(account)).map_err(|_| ClientError::InvalidAccountData(*id))
    }
}
