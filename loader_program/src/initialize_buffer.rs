// initialize_buffer.rs: stage code in a fresh buffer account.
//
// Expected accounts:
// - accounts[0]: buffer (signer, uninitialized)
// - accounts[1]: authority recorded on the buffer

use ledger_core::{ProgramResult, is_uninitialized, require_accounts, require_signer, write_state};
use loader_core::{LoaderError, LoaderState};
use nssa_core::account::AccountWithMetadata;
use nssa_core::program::{AccountPostState, ProgramId};
use tracing::info;

pub fn handle(
    loader_id: &ProgramId,
    accounts: &[AccountWithMetadata],
    code: Vec<u8>,
) -> ProgramResult {
    require_accounts(accounts, 2)?;
    let buffer = &accounts[0];
    let authority = &accounts[1];

    require_signer(buffer)?;
    if !is_uninitialized(&buffer.account) {
        return Err(LoaderError::AccountAlreadyInitialized.into());
    }

    let state = LoaderState::Buffer {
        authority: Some(authority.account_id),
        code,
    };
    let mut buffer_post = write_state(&buffer.account, &state)?;
    buffer_post.program_owner = *loader_id;

    info!(buffer = %buffer.account_id, authority = %authority.account_id, "buffer initialized");

    let mut post_states = crate::unchanged(accounts);
    post_states[0] = AccountPostState::new_claimed(buffer_post);
    Ok((post_states, vec![]))
}
