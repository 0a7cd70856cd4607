// set_owners.rs: owner-set change handlers.
//
// Only reachable as the chained call of an executed transaction: the derived
// authority must be authorized, and only the multisig program can authorize it.
//
// Expected accounts:
// - accounts[0]: multisig
// - accounts[1]: multisig_signer (authorized)

use ledger_core::{ProgramResult, read_state, require_accounts, write_state};
use nssa_core::account::{AccountId, AccountWithMetadata};
use nssa_core::program::{AccountPostState, ProgramId};
use multisig_core::{MultisigError, MultisigState, compute_multisig_signer_pda};
use tracing::info;

pub fn handle_set_owners(
    program_id: &ProgramId,
    accounts: &[AccountWithMetadata],
    owners: &[AccountId],
) -> ProgramResult {
    update(program_id, accounts, |state| state.set_owners(owners.to_vec()))
}

pub fn handle_change_threshold(
    program_id: &ProgramId,
    accounts: &[AccountWithMetadata],
    threshold: u64,
) -> ProgramResult {
    update(program_id, accounts, |state| state.change_threshold(threshold))
}

pub fn handle_set_owners_and_change_threshold(
    program_id: &ProgramId,
    accounts: &[AccountWithMetadata],
    owners: &[AccountId],
    threshold: u64,
) -> ProgramResult {
    update(program_id, accounts, |state| {
        state.set_owners_and_change_threshold(owners.to_vec(), threshold)
    })
}

fn update(
    program_id: &ProgramId,
    accounts: &[AccountWithMetadata],
    change: impl FnOnce(&mut MultisigState) -> Result<(), MultisigError>,
) -> ProgramResult {
    require_accounts(accounts, 2)?;
    let multisig_account = &accounts[0];
    let authority = &accounts[1];

    let mut state: MultisigState = read_state(multisig_account, program_id)?;
    if authority.account_id != compute_multisig_signer_pda(program_id, &multisig_account.account_id)
    {
        return Err(MultisigError::InvalidDerivedAuthority.into());
    }
    if !authority.is_authorized {
        return Err(MultisigError::UnauthorizedOwnerChange.into());
    }

    change(&mut state)?;

    info!(
        multisig = %multisig_account.account_id,
        owners = state.owners.len(),
        threshold = state.threshold,
        owner_set_seqno = state.owner_set_seqno,
        "owner set changed"
    );

    let mut post_states = crate::unchanged(accounts);
    post_states[0] = AccountPostState::new(write_state(&multisig_account.account, &state)?);
    Ok((post_states, vec![]))
}
