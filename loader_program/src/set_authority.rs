// set_authority.rs: change or drop the authority of program data or a buffer.
//
// Expected accounts:
// - accounts[0]: program_data or buffer
// - accounts[1]: current authority (signer)

use ledger_core::{ProgramResult, require_accounts, write_state};
use loader_core::{LoaderError, LoaderState};
use nssa_core::account::{AccountId, AccountWithMetadata};
use nssa_core::program::{AccountPostState, ProgramId};
use tracing::info;

use crate::loader_state;

pub fn handle(
    loader_id: &ProgramId,
    accounts: &[AccountWithMetadata],
    new_authority: Option<AccountId>,
) -> ProgramResult {
    require_accounts(accounts, 2)?;
    let target = &accounts[0];
    let current = &accounts[1];

    if !current.is_authorized {
        return Err(LoaderError::MissingAuthoritySignature.into());
    }

    let (authority, updated) = match loader_state(target, loader_id) {
        Some(LoaderState::ProgramData {
            upgrade_authority,
            code,
        }) => (
            upgrade_authority,
            LoaderState::ProgramData {
                upgrade_authority: new_authority,
                code,
            },
        ),
        Some(LoaderState::Buffer { authority, code }) => (
            authority,
            LoaderState::Buffer {
                authority: new_authority,
                code,
            },
        ),
        _ => return Err(LoaderError::NotProgramData.into()),
    };

    match authority {
        None => return Err(LoaderError::Immutable.into()),
        Some(authority) if authority != current.account_id => {
            return Err(LoaderError::IncorrectAuthority.into());
        }
        Some(_) => {}
    }

    info!(
        account = %target.account_id,
        new_authority = ?new_authority.map(|a| a.to_string()),
        "authority changed"
    );

    let mut post_states = crate::unchanged(accounts);
    post_states[0] = AccountPostState::new(write_state(&target.account, &updated)?);
    Ok((post_states, vec![]))
}
