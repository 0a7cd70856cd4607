use ledger::LedgerError;
use nssa_core::account::AccountId;
use multisig_core::MultisigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("multisig rejected the request: {0}")]
    Multisig(MultisigError),

    #[error("the governed action failed: {0}")]
    ExternalActionFailed(#[source] LedgerError),

    #[error(transparent)]
    Ledger(LedgerError),

    #[error("account {0} not found")]
    AccountNotFound(AccountId),

    #[error("account {0} does not hold the expected state")]
    InvalidAccountData(AccountId),

    #[error("failed to encode action: {0}")]
    Encoding(#[from] std::io::Error),
}

impl ClientError {
    /// The multisig error behind this failure, if any.
    pub fn multisig_error(&self) -> Option<MultisigError> {
        match self {
            ClientError::Multisig(e) => Some(*e),
            _ => None,
        }
    }
}
