//! ledger: in-memory, key-addressed account store with an atomic instruction
//! runtime.
//!
//! Every submitted [`Transaction`] runs against an overlay of the store. The
//! overlay is committed only when the top-level call and all of its chained
//! calls succeed, so a rejected transaction never leaves partial effects.

pub mod config;
pub mod error;
pub mod transaction;

use std::collections::{HashMap, HashSet};

use ledger_core::{Program, account_data, display_program_id, instruction_bytes, is_uninitialized};
use nssa_core::account::{Account, AccountId, AccountWithMetadata};
use nssa_core::program::{AccountPostState, ProgramId};
use tracing::{debug, info, warn};

pub use config::LedgerConfig;
pub use error::LedgerError;
pub use transaction::Transaction;

pub struct Ledger {
    config: LedgerConfig,
    accounts: HashMap<AccountId, Account>,
    programs: HashMap<ProgramId, Box<dyn Program>>,
}

impl Ledger {
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            accounts: HashMap::new(),
            programs: HashMap::new(),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn register_program<P: Program + 'static>(
        &mut self,
        program: P,
    ) -> Result<ProgramId, LedgerError> {
        let program_id = program.id();
        if self.programs.contains_key(&program_id) {
            return Err(LedgerError::ProgramAlreadyRegistered(program_id));
        }
        self.programs.insert(program_id, Box::new(program));
        info!(program = %display_program_id(&program_id), "program registered");
        Ok(program_id)
    }

    /// Write an account directly, bypassing programs. Genesis only.
    pub fn insert_account(&mut self, account_id: AccountId, account: Account) {
        self.accounts.insert(account_id, account);
    }

    pub fn get_account(&self, account_id: &AccountId) -> Option<&Account> {
        self.accounts.get(account_id)
    }

    /// Current contents of an account; missing accounts read as uninitialized.
    pub fn account(&self, account_id: &AccountId) -> Account {
        self.accounts.get(account_id).cloned().unwrap_or_default()
    }

    /// Run a transaction to completion or not at all.
    pub fn submit(&mut self, transaction: &Transaction) -> Result<(), LedgerError> {
        let signer_ids: HashSet<AccountId> =
            transaction.signers.iter().map(|key| key.account_id()).collect();

        let changes = {
            let mut overlay = Overlay::new(&self.accounts);
            let pre_states = transaction
                .account_ids
                .iter()
                .map(|id| with_metadata(*id, overlay.get(id), signer_ids.contains(id)))
                .collect();

            if let Err(error) = self.run(
                &mut overlay,
                transaction.program_id,
                pre_states,
                &transaction.instruction_data,
                0,
            ) {
                warn!(%error, "transaction rejected");
                return Err(error);
            }
            overlay.into_changes()
        };

        debug!(accounts = changes.len(), "committing transaction");
        self.accounts.extend(changes);
        Ok(())
    }

    fn run(
        &self,
        overlay: &mut Overlay<'_>,
        program_id: ProgramId,
        pre_states: Vec<AccountWithMetadata>,
        instruction_data: &[u8],
        depth: usize,
    ) -> Result<(), LedgerError> {
        if depth > self.config.max_call_depth {
            return Err(LedgerError::CallDepthExceeded(depth));
        }
        // Rule violations inside a chained call are reported with the depth
        // they happened at.
        let reject = |error: LedgerError| {
            if depth == 0 {
                error
            } else {
                LedgerError::ChainedCallRejected {
                    program_id,
                    depth,
                    error: Box::new(error),
                }
            }
        };
        ensure_distinct(&pre_states).map_err(reject)?;

        let program = self
            .programs
            .get(&program_id)
            .ok_or(LedgerError::UnknownProgram(program_id))
            .map_err(reject)?;

        debug!(
            program = %display_program_id(&program_id),
            depth,
            accounts = pre_states.len(),
            "executing program"
        );
        let (post_states, chained_calls) = program
            .execute(&pre_states, instruction_data)
            .map_err(|error| LedgerError::Program {
                program_id,
                depth,
                error,
            })?;

        self.validate(&program_id, &pre_states, &post_states)
            .map_err(reject)?;

        for (pre, post) in pre_states.iter().zip(post_states) {
            let mut account = post.account().clone();
            if post.requires_claim() {
                account.program_owner = program_id;
            }
            overlay.set(pre.account_id, account);
        }

        for call in chained_calls {
            let pda_ids: HashSet<AccountId> = call
                .pda_seeds
                .iter()
                .map(|seed| AccountId::from((&program_id, seed)))
                .collect();

            let chained_pre_states = call
                .pre_states
                .iter()
                .map(|requested| {
                    let inherited = pre_states
                        .iter()
                        .any(|p| p.account_id == requested.account_id && p.is_authorized);
                    if requested.is_authorized
                        && !inherited
                        && !pda_ids.contains(&requested.account_id)
                    {
                        return Err(LedgerError::UnauthorizedChainedAccount(requested.account_id));
                    }
                    Ok(with_metadata(
                        requested.account_id,
                        overlay.get(&requested.account_id),
                        requested.is_authorized,
                    ))
                })
                .collect::<Result<Vec<_>, _>>()?;

            debug!(
                caller = %display_program_id(&program_id),
                callee = %display_program_id(&call.program_id),
                depth = depth + 1,
                "chained call"
            );
            let instruction_data = instruction_bytes(&call.instruction_data)
                .ok_or(LedgerError::MalformedChainedInstruction(call.program_id))?;
            self.run(
                overlay,
                call.program_id,
                chained_pre_states,
                &instruction_data,
                depth + 1,
            )?;
        }

        Ok(())
    }

    fn validate(
        &self,
        program_id: &ProgramId,
        pre_states: &[AccountWithMetadata],
        post_states: &[AccountPostState],
    ) -> Result<(), LedgerError> {
        if pre_states.len() != post_states.len() {
            return Err(LedgerError::PostStateCountMismatch {
                expected: pre_states.len(),
                actual: post_states.len(),
            });
        }

        for (pre, post) in pre_states.iter().zip(post_states) {
            let id = pre.account_id;
            let before = &pre.account;
            let after = post.account();

            if post.requires_claim() {
                if !is_uninitialized(before) {
                    return Err(LedgerError::InvalidClaim(id));
                }
            } else {
                if after.program_owner != before.program_owner {
                    return Err(LedgerError::OwnerModified(id));
                }
                if before.program_owner != *program_id {
                    if after.data != before.data {
                        return Err(LedgerError::IllegalDataModification(id));
                    }
                    if after.balance < before.balance {
                        return Err(LedgerError::IllegalBalanceDebit(id));
                    }
                }
            }

            if after.nonce != before.nonce {
                return Err(LedgerError::NonceModified(id));
            }

            let len = account_data(after).len();
            if len > self.config.max_account_data_len {
                return Err(LedgerError::DataTooLarge {
                    account_id: id,
                    len,
                    limit: self.config.max_account_data_len,
                });
            }
        }

        let total_before = total_balance(pre_states.iter().map(|p| p.account.balance));
        let total_after = total_balance(post_states.iter().map(|p| p.account().balance));
        match (total_before, total_after) {
            (Some(before), Some(after)) if before == after => Ok(()),
            _ => Err(LedgerError::BalanceNotConserved),
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

fn ensure_distinct(pre_states: &[AccountWithMetadata]) -> Result<(), LedgerError> {
    let mut seen = HashSet::new();
    for pre in pre_states {
        if !seen.insert(pre.account_id) {
            return Err(LedgerError::DuplicateAccount(pre.account_id));
        }
    }
    Ok(())
}

fn total_balance(mut balances: impl Iterator<Item = u128>) -> Option<u128> {
    balances.try_fold(0u128, |sum, balance| sum.checked_add(balance))
}

fn with_metadata(account_id: AccountId, account: Account, is_authorized: bool) -> AccountWithMetadata {
    AccountWithMetadata {
        account_id,
        account,
        is_authorized,
    }
}

/// Uncommitted writes on top of the account store.
struct Overlay<'a> {
    base: &'a HashMap<AccountId, Account>,
    changes: HashMap<AccountId, Account>,
}

impl<'a> Overlay<'a> {
    fn new(base: &'a HashMap<AccountId, Account>) -> Self {
        Self {
            base,
            changes: HashMap::new(),
        }
    }

    fn get(&self, account_id: &AccountId) -> Account {
        self.changes
            .get(account_id)
            .or_else(|| self.base.get(account_id))
            .cloned()
            .unwrap_or_default()
    }

    fn set(&mut self, account_id: AccountId, account: Account) {
        self.changes.insert(account_id, account);
    }

    fn into_changes(self) -> HashMap<AccountId, Account> {
        self.changes
    }
}

#[cfg(test)]
mod tests;
