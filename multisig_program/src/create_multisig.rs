// create_multisig.rs: handler for the CreateMultisig instruction.
//
// Expected accounts:
// - accounts[0]: multisig PDA of `create_key` (must be uninitialized)

use ledger_core::{ProgramResult, is_uninitialized, require_accounts, write_state};
use nssa_core::account::{AccountId, AccountWithMetadata};
use nssa_core::program::{AccountPostState, ProgramId};
use multisig_core::{MultisigError, MultisigState, compute_multisig_pda};
use tracing::info;

pub fn handle(
    program_id: &ProgramId,
    accounts: &[AccountWithMetadata],
    create_key: &[u8; 32],
    owners: &[AccountId],
    threshold: u64,
) -> ProgramResult {
    require_accounts(accounts, 1)?;
    let multisig = &accounts[0];

    if multisig.account_id != compute_multisig_pda(program_id, create_key) {
        return Err(MultisigError::InvalidMultisigAddress.into());
    }
    if !is_uninitialized(&multisig.account) {
        return Err(MultisigError::AccountAlreadyInitialized.into());
    }

    let state = MultisigState::new(*create_key, owners.to_vec(), threshold)?;
    let multisig_post = write_state(&multisig.account, &state)?;

    info!(
        multisig = %multisig.account_id,
        owners = state.owners.len(),
        threshold,
        "multisig created"
    );

    let mut post_states = crate::unchanged(accounts);
    post_states[0] = AccountPostState::new_claimed(multisig_post);
    Ok((post_states, vec![]))
}
