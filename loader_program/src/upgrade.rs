// upgrade.rs: swap a program's code for the contents of a buffer.
//
// Expected accounts:
// - accounts[0]: program_data
// - accounts[1]: program
// - accounts[2]: buffer
// - accounts[3]: spill (receives the buffer's balance)
// - accounts[4]: authority (signer)

use ledger_core::{ProgramError, ProgramResult, require_accounts, write_state};
use loader_core::{LoaderError, LoaderState};
use nssa_core::account::{Account, AccountId, AccountWithMetadata};
use nssa_core::program::{AccountPostState, ProgramId};
use tracing::info;

use crate::loader_state;

pub fn handle(
    loader_id: &ProgramId,
    accounts: &[AccountWithMetadata],
) -> ProgramResult {
    require_accounts(accounts, 5)?;
    let program_data = &accounts[0];
    let program = &accounts[1];
    let buffer = &accounts[2];
    let spill = &accounts[3];
    let authority = &accounts[4];

    if !authority.is_authorized {
        return Err(LoaderError::MissingAuthoritySignature.into());
    }

    match loader_state(program, loader_id) {
        Some(LoaderState::Program { program_data: linked }) if linked == program_data.account_id => {}
        Some(LoaderState::Program { .. }) => return Err(LoaderError::ProgramDataMismatch.into()),
        _ => return Err(LoaderError::NotAProgram.into()),
    }

    let Some(LoaderState::ProgramData { upgrade_authority, .. }) =
        loader_state(program_data, loader_id)
    else {
        return Err(LoaderError::NotProgramData.into());
    };
    check_authority(upgrade_authority, &authority.account_id)?;

    let Some(LoaderState::Buffer {
        authority: buffer_authority,
        code,
    }) = loader_state(buffer, loader_id)
    else {
        return Err(LoaderError::NotABuffer.into());
    };
    check_authority(buffer_authority, &authority.account_id)?;

    let program_data_post = write_state(
        &program_data.account,
        &LoaderState::ProgramData {
            upgrade_authority,
            code,
        },
    )?;
    let mut buffer_post = Account::default();
    buffer_post.program_owner = buffer.account.program_owner;
    buffer_post.nonce = buffer.account.nonce;
    let mut spill_post = spill.account.clone();
    spill_post.balance = spill_post
        .balance
        .checked_add(buffer.account.balance)
        .ok_or(ProgramError::ArithmeticOverflow)?;

    info!(
        program = %program.account_id,
        buffer = %buffer.account_id,
        "program upgraded"
    );

    let mut post_states = crate::unchanged(accounts);
    post_states[0] = AccountPostState::new(program_data_post);
    post_states[2] = AccountPostState::new(buffer_post);
    post_states[3] = AccountPostState::new(spill_post);
    Ok((post_states, vec![]))
}

fn check_authority(expected: Option<AccountId>, signer: &AccountId) -> Result<(), LoaderError> {
    match expected {
        None => Err(LoaderError::Immutable),
        Some(expected) if expected != *signer => Err(LoaderError::IncorrectAuthority),
        Some(_) => Ok(()),
    }
}
