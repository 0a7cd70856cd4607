// delegate.rs: delegate lists: addresses allowed to act for one owner.
//
// A delegate proposes or approves in the owner's name; the owner's identity
// is what ends up in a transaction's signers.

use ledger_core::{
    ProgramError, ProgramResult, is_uninitialized, read_state, require_accounts, require_signer,
    write_state,
};
use nssa_core::account::{AccountId, AccountWithMetadata};
use nssa_core::program::{AccountPostState, ProgramId};
use multisig_core::{
    DelegateList, MultisigError, MultisigState, compute_delegate_list_pda,
    compute_multisig_signer_pda,
};
use tracing::info;

use crate::approve::record_approval;

/// Resolve the owner `signer` acts for through `delegate_list_account`.
pub(crate) fn resolve_owner(
    program_id: &ProgramId,
    multisig_id: &AccountId,
    signer: &AccountId,
    delegate_list_account: &AccountWithMetadata,
) -> Result<AccountId, ProgramError> {
    let list = read_delegate_list(program_id, multisig_id, delegate_list_account)?;
    if !list.is_delegate(signer) {
        return Err(MultisigError::NotADelegate.into());
    }
    Ok(list.owner)
}

fn read_delegate_list(
    program_id: &ProgramId,
    multisig_id: &AccountId,
    account: &AccountWithMetadata,
) -> Result<DelegateList, ProgramError> {
    let list: DelegateList = read_state(account, program_id)?;
    if list.multisig != *multisig_id {
        return Err(MultisigError::MultisigMismatch.into());
    }
    if account.account_id != compute_delegate_list_pda(program_id, multisig_id, &list.owner) {
        return Err(MultisigError::InvalidDelegateListAddress.into());
    }
    Ok(list)
}

/// Handle `CreateDelegateList`.
///
/// Accounts:
/// 0. `multisig`
/// 1. `owner`: signer, a current owner
/// 2. `delegate_list`: PDA of (`multisig`, `owner`), uninitialized
pub fn handle_create(
    program_id: &ProgramId,
    accounts: &[AccountWithMetadata],
    delegates: &[AccountId],
) -> ProgramResult {
    require_accounts(accounts, 3)?;
    let multisig_account = &accounts[0];
    let owner_account = &accounts[1];
    let list_account = &accounts[2];

    require_signer(owner_account)?;
    let multisig: MultisigState = read_state(multisig_account, program_id)?;
    if !multisig.is_owner(&owner_account.account_id) {
        return Err(MultisigError::NotAnOwner.into());
    }

    let expected = compute_delegate_list_pda(
        program_id,
        &multisig_account.account_id,
        &owner_account.account_id,
    );
    if list_account.account_id != expected {
        return Err(MultisigError::InvalidDelegateListAddress.into());
    }
    if !is_uninitialized(&list_account.account) {
        return Err(MultisigError::AccountAlreadyInitialized.into());
    }

    let list = DelegateList {
        multisig: multisig_account.account_id,
        owner: owner_account.account_id,
        delegates: delegates.to_vec(),
    };

    info!(
        owner = %list.owner,
        delegates = list.delegates.len(),
        "delegate list created"
    );

    let mut post_states = crate::unchanged(accounts);
    post_states[2] = AccountPostState::new_claimed(write_state(&list_account.account, &list)?);
    Ok((post_states, vec![]))
}

/// Handle `SetDelegateList`. The authority is either the list's owner or the
/// multisig's derived authority.
///
/// Accounts:
/// 0. `multisig`
/// 1. `authority`: signer
/// 2. `delegate_list`
pub fn handle_set(
    program_id: &ProgramId,
    accounts: &[AccountWithMetadata],
    delegates: &[AccountId],
) -> ProgramResult {
    require_accounts(accounts, 3)?;
    let multisig_account = &accounts[0];
    let authority = &accounts[1];
    let list_account = &accounts[2];

    require_signer(authority)?;
    let _: MultisigState = read_state(multisig_account, program_id)?;
    let mut list = read_delegate_list(program_id, &multisig_account.account_id, list_account)?;

    let multisig_signer = compute_multisig_signer_pda(program_id, &multisig_account.account_id);
    if authority.account_id != list.owner && authority.account_id != multisig_signer {
        return Err(MultisigError::NotAnOwner.into());
    }

    list.delegates = delegates.to_vec();
    info!(owner = %list.owner, delegates = list.delegates.len(), "delegate list updated");

    let mut post_states = crate::unchanged(accounts);
    post_states[2] = AccountPostState::new(write_state(&list_account.account, &list)?);
    Ok((post_states, vec![]))
}

/// Handle `DelegateApprove`.
///
/// Accounts:
/// 0. `multisig`
/// 1. `delegate`: signer
/// 2. `transaction`
/// 3. `delegate_list`
pub fn handle_approve(
    program_id: &ProgramId,
    accounts: &[AccountWithMetadata],
) -> ProgramResult {
    require_accounts(accounts, 4)?;
    let multisig_account = &accounts[0];
    let delegate = &accounts[1];

    require_signer(delegate)?;
    let owner = resolve_owner(
        program_id,
        &multisig_account.account_id,
        &delegate.account_id,
        &accounts[3],
    )?;
    record_approval(program_id, accounts, owner)
}
