// Execute handler: runs an approved transaction by emitting a ChainedCall.
//
// The multisig doesn't perform actions itself. It marks the transaction
// executed and chains to the action's program with the derived authority
// authorized through its PDA seed. If the chained call fails the ledger
// discards the whole transaction, `did_execute` included.
//
// Expected accounts:
// - accounts[0]: multisig
// - accounts[1]: multisig_signer (the derived authority)
// - accounts[2]: transaction
// - accounts[3..]: action accounts not already listed above

use ledger_core::{ProgramResult, instruction_words, read_state, require_accounts, write_state};
use nssa_core::account::{AccountId, AccountWithMetadata};
use nssa_core::program::{AccountPostState, ChainedCall, ProgramId};
use multisig_core::{DerivedAuthority, MultisigError, MultisigState, TransactionState};
use tracing::info;

pub fn handle(
    program_id: &ProgramId,
    accounts: &[AccountWithMetadata],
) -> ProgramResult {
    require_accounts(accounts, 3)?;
    let multisig_account = &accounts[0];
    let signer_account = &accounts[1];
    let transaction_account = &accounts[2];

    let multisig: MultisigState = read_state(multisig_account, program_id)?;
    let mut transaction: TransactionState = read_state(transaction_account, program_id)?;

    if transaction.multisig != multisig_account.account_id {
        return Err(MultisigError::MultisigMismatch.into());
    }
    let authority = DerivedAuthority::new(program_id, &multisig_account.account_id);
    if signer_account.account_id != authority.address() {
        return Err(MultisigError::InvalidDerivedAuthority.into());
    }
    if transaction.did_execute {
        return Err(MultisigError::AlreadyExecuted.into());
    }
    // Approvals count only for owners that are still owners now.
    if !multisig.has_threshold(&transaction.signers) {
        return Err(MultisigError::InsufficientApprovals.into());
    }

    let action_accounts = transaction
        .action
        .accounts
        .iter()
        .map(|id| action_account(accounts, id, &authority))
        .collect::<Result<Vec<_>, _>>()?;

    let chained_call = ChainedCall {
        program_id: transaction.action.program_id,
        instruction_data: instruction_words(&transaction.action.data),
        pre_states: action_accounts,
        pda_seeds: vec![authority.seed()],
    };

    transaction.did_execute = true;

    info!(
        multisig = %multisig_account.account_id,
        transaction = %transaction_account.account_id,
        approvals = multisig.count_valid_signers(&transaction.signers),
        threshold = multisig.threshold,
        "transaction executed"
    );

    let mut post_states = crate::unchanged(accounts);
    post_states[2] =
        AccountPostState::new(write_state(&transaction_account.account, &transaction)?);
    Ok((post_states, vec![chained_call]))
}

/// Look up an action account among the provided accounts. Only the derived
/// authority is passed on authorized.
fn action_account(
    accounts: &[AccountWithMetadata],
    id: &AccountId,
    authority: &DerivedAuthority,
) -> Result<AccountWithMetadata, MultisigError> {
    let provided = accounts
        .iter()
        .find(|a| a.account_id == *id)
        .ok_or(MultisigError::TargetAccountMismatch)?;
    Ok(AccountWithMetadata {
        account_id: *id,
        account: provided.account.clone(),
        is_authorized: *id == authority.address(),
    })
}
