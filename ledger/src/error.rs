use ledger_core::{ProgramError, display_program_id};
use nssa_core::account::AccountId;
use nssa_core::program::ProgramId;
use thiserror::Error;

/// Why the ledger rejected a transaction. A rejected transaction leaves no
/// trace in the account store.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("program {} is not registered", display_program_id(.0))]
    UnknownProgram(ProgramId),

    #[error("program {} is already registered", display_program_id(.0))]
    ProgramAlreadyRegistered(ProgramId),

    #[error("account {0} appears more than once in the same call")]
    DuplicateAccount(AccountId),

    #[error("program returned {actual} post states for {expected} accounts")]
    PostStateCountMismatch { expected: usize, actual: usize },

    #[error("owner of account {0} was changed")]
    OwnerModified(AccountId),

    #[error("account {0} cannot be claimed: it is already initialized")]
    InvalidClaim(AccountId),

    #[error("data of account {0} was modified by a program that does not own it")]
    IllegalDataModification(AccountId),

    #[error("account {0} was debited by a program that does not own it")]
    IllegalBalanceDebit(AccountId),

    #[error("nonce of account {0} was changed by a program")]
    NonceModified(AccountId),

    #[error("call does not conserve total balance")]
    BalanceNotConserved,

    #[error("account {account_id} data is {len} bytes, limit is {limit}")]
    DataTooLarge {
        account_id: AccountId,
        len: usize,
        limit: usize,
    },

    #[error("chained call depth {0} exceeds the configured maximum")]
    CallDepthExceeded(usize),

    #[error("chained call to program {} carries malformed instruction data", display_program_id(.0))]
    MalformedChainedInstruction(ProgramId),

    #[error("chained call marks account {0} authorized without authority over it")]
    UnauthorizedChainedAccount(AccountId),

    #[error("program {} failed at call depth {depth}: {error}", display_program_id(.program_id))]
    Program {
        program_id: ProgramId,
        depth: usize,
        #[source]
        error: ProgramError,
    },

    #[error("chained call to program {} rejected at depth {depth}: {error}", display_program_id(.program_id))]
    ChainedCallRejected {
        program_id: ProgramId,
        depth: usize,
        #[source]
        error: Box<LedgerError>,
    },

    #[error("failed to encode instruction: {0}")]
    Encoding(#[from] std::io::Error),
}

impl LedgerError {
    /// Whether the failure happened inside a chained call rather than in the
    /// top-level program call.
    pub fn is_chained(&self) -> bool {
        match self {
            LedgerError::Program { depth, .. } | LedgerError::ChainedCallRejected { depth, .. } => {
                *depth > 0
            }
            LedgerError::CallDepthExceeded(_)
            | LedgerError::UnauthorizedChainedAccount(_)
            | LedgerError::MalformedChainedInstruction(_) => true,
            _ => false,
        }
    }
}
