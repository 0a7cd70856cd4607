// create_transaction.rs: handler for the CreateTransaction instruction.
//
// Proposes an action. The transaction lives in its own PDA, so proposing
// never writes to the multisig account.
//
// Expected accounts:
// - accounts[0]: multisig
// - accounts[1]: proposer (must be authorized signer)
// - accounts[2]: transaction PDA of (multisig, create_key), uninitialized
// - accounts[3]: delegate list (optional, when the proposer is a delegate)

use ledger_core::{
    ProgramResult, is_uninitialized, read_state, require_accounts, require_signer, write_state,
};
use nssa_core::account::AccountWithMetadata;
use nssa_core::program::{AccountPostState, ProgramId};
use multisig_core::{
    Instruction, MultisigError, MultisigState, TransactionAction, TransactionState,
    assert_unique_owners, compute_transaction_pda, validate_owner_set, validate_threshold,
};
use tracing::info;

use crate::delegate::resolve_owner;

pub fn handle(
    program_id: &ProgramId,
    accounts: &[AccountWithMetadata],
    create_key: &[u8; 32],
    action: &TransactionAction,
) -> ProgramResult {
    require_accounts(accounts, 3)?;
    let multisig_account = &accounts[0];
    let proposer = &accounts[1];
    let transaction_account = &accounts[2];

    require_signer(proposer)?;
    let multisig: MultisigState = read_state(multisig_account, program_id)?;

    let expected = compute_transaction_pda(program_id, &multisig_account.account_id, create_key);
    if transaction_account.account_id != expected {
        return Err(MultisigError::InvalidTransactionAddress.into());
    }
    if !is_uninitialized(&transaction_account.account) {
        return Err(MultisigError::AccountAlreadyInitialized.into());
    }

    let owner = match accounts.get(3) {
        Some(list) => resolve_owner(
            program_id,
            &multisig_account.account_id,
            &proposer.account_id,
            list,
        )?,
        None => proposer.account_id,
    };
    if !multisig.is_owner(&owner) {
        return Err(MultisigError::NotAnOwner.into());
    }

    validate_owner_set_change(program_id, &multisig, action)?;

    let transaction =
        TransactionState::new(multisig_account.account_id, owner, action.clone(), &multisig);

    info!(
        multisig = %multisig_account.account_id,
        transaction = %transaction_account.account_id,
        proposer = %owner,
        "transaction proposed"
    );

    let mut post_states = crate::unchanged(accounts);
    post_states[2] =
        AccountPostState::new_claimed(write_state(&transaction_account.account, &transaction)?);
    Ok((post_states, vec![]))
}

/// Reject owner-set changes that could never execute, before any record exists.
fn validate_owner_set_change(
    program_id: &ProgramId,
    multisig: &MultisigState,
    action: &TransactionAction,
) -> Result<(), MultisigError> {
    match action.multisig_instruction(program_id) {
        Some(Instruction::SetOwnersAndChangeThreshold { owners, threshold }) => {
            validate_owner_set(&owners, threshold)
        }
        Some(Instruction::SetOwners { owners }) => {
            assert_unique_owners(&owners)?;
            if owners.is_empty() {
                return Err(MultisigError::EmptyOwners);
            }
            Ok(())
        }
        Some(Instruction::ChangeThreshold { threshold }) => {
            validate_threshold(threshold, multisig.owners.len())
        }
        _ => Ok(()),
    }
}
