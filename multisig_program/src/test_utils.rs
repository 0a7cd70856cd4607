// Fixtures shared by the handler tests.

use borsh::{BorshDeserialize, BorshSerialize};
use ledger_core::{ProgramError, ProgramResult, account_data};
use nssa_core::account::{Account, AccountId, AccountWithMetadata};
use nssa_core::program::{AccountPostState, ProgramId};
use multisig_core::{
    MultisigError, MultisigState, TransactionAction, TransactionState, compute_multisig_pda,
    compute_transaction_pda,
};

pub const PROGRAM_ID: ProgramId = [7, 7, 7, 7, 7, 7, 7, 7];
pub const CREATE_KEY: [u8; 32] = [1u8; 32];
pub const TX_KEY: [u8; 32] = [2u8; 32];

pub fn owner(n: u8) -> AccountId {
    AccountId::new([n; 32])
}

pub fn make_account(id: AccountId, account: Account, authorized: bool) -> AccountWithMetadata {
    AccountWithMetadata {
        account_id: id,
        account,
        is_authorized: authorized,
    }
}

pub fn owned_by_program<T: BorshSerialize>(state: &T) -> Account {
    let mut account = Account::default();
    account.program_owner = PROGRAM_ID;
    account.data = borsh::to_vec(state).unwrap().try_into().unwrap();
    account
}

pub fn multisig_id() -> AccountId {
    compute_multisig_pda(&PROGRAM_ID, &CREATE_KEY)
}

pub fn transaction_id() -> AccountId {
    compute_transaction_pda(&PROGRAM_ID, &multisig_id(), &TX_KEY)
}

/// Multisig of owners `1..=n` (as produced by `owner`).
pub fn multisig_state(n: u8, threshold: u64) -> MultisigState {
    MultisigState::new(CREATE_KEY, (1..=n).map(owner).collect(), threshold).unwrap()
}

pub fn multisig_account(state: &MultisigState) -> AccountWithMetadata {
    make_account(multisig_id(), owned_by_program(state), false)
}

pub fn noop_action() -> TransactionAction {
    TransactionAction {
        program_id: [9; 8],
        accounts: vec![owner(50)],
        data: vec![1, 2, 3],
    }
}

pub fn transaction_account(tx: &TransactionState) -> AccountWithMetadata {
    make_account(transaction_id(), owned_by_program(tx), false)
}

pub fn decode<T: BorshDeserialize>(post: &AccountPostState) -> T {
    borsh::from_slice(&account_data(post.account())).unwrap()
}

pub fn custom(error: MultisigError) -> ProgramError {
    ProgramError::from(error)
}

pub fn expect_err(result: ProgramResult) -> ProgramError {
    match result {
        Ok(_) => panic!("handler succeeded, expected an error"),
        Err(error) => error,
    }
}
