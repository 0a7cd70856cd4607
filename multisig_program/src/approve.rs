// approve.rs: handler for the Approve instruction.
//
// Expected accounts:
// - accounts[0]: multisig
// - accounts[1]: approving owner (must be authorized signer)
// - accounts[2]: transaction

use ledger_core::{ProgramResult, read_state, require_accounts, require_signer, write_state};
use nssa_core::account::{AccountId, AccountWithMetadata};
use nssa_core::program::{AccountPostState, ProgramId};
use multisig_core::{MultisigError, MultisigState, TransactionState};
use tracing::{debug, info};

pub fn handle(
    program_id: &ProgramId,
    accounts: &[AccountWithMetadata],
) -> ProgramResult {
    require_accounts(accounts, 3)?;
    let owner = &accounts[1];
    require_signer(owner)?;
    record_approval(program_id, accounts, owner.account_id)
}

/// Add `owner`'s approval to the transaction at `accounts[2]`.
///
/// A transaction proposed under an older owner set no longer accepts
/// approvals, so its signer list stays as it was when the set changed.
pub(crate) fn record_approval(
    program_id: &ProgramId,
    accounts: &[AccountWithMetadata],
    owner: AccountId,
) -> ProgramResult {
    let multisig_account = &accounts[0];
    let transaction_account = &accounts[2];

    let multisig: MultisigState = read_state(multisig_account, program_id)?;
    let mut transaction: TransactionState = read_state(transaction_account, program_id)?;

    if transaction.multisig != multisig_account.account_id {
        return Err(MultisigError::MultisigMismatch.into());
    }
    if transaction.did_execute {
        return Err(MultisigError::AlreadyExecuted.into());
    }
    if transaction.is_outdated(&multisig) {
        return Err(MultisigError::OwnerSetChanged.into());
    }
    if !multisig.is_owner(&owner) {
        return Err(MultisigError::NotAnOwner.into());
    }

    let mut post_states = crate::unchanged(accounts);
    if transaction.approve(owner) {
        info!(
            transaction = %transaction_account.account_id,
            %owner,
            signers = transaction.signers.len(),
            "transaction approved"
        );
        post_states[2] =
            AccountPostState::new(write_state(&transaction_account.account, &transaction)?);
    } else {
        debug!(transaction = %transaction_account.account_id, %owner, "repeat approval ignored");
    }
    Ok((post_states, vec![]))
}
