use ledger_core::ProgramError;
use thiserror::Error;

/// Errors raised by the multisig program. Discriminants are the
/// `ProgramError::Custom` codes seen by callers.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum MultisigError {
    #[error("Threshold must be between 1 and the number of owners.")]
    InvalidThreshold = 0,

    #[error("The given owner is not part of this multisig.")]
    NotAnOwner = 1,

    #[error("Not enough owners signed this transaction.")]
    InsufficientApprovals = 2,

    #[error("The given transaction has already been executed.")]
    AlreadyExecuted = 3,

    #[error("Owners length must be non zero.")]
    EmptyOwners = 4,

    #[error("Owners must be unique.")]
    DuplicateOwners = 5,

    #[error("Account belongs to a different multisig.")]
    MultisigMismatch = 6,

    #[error("Multisig account does not match its create key.")]
    InvalidMultisigAddress = 7,

    #[error("Transaction account does not match its create key.")]
    InvalidTransactionAddress = 8,

    #[error("Delegate list account does not match its owner.")]
    InvalidDelegateListAddress = 9,

    #[error("Account is not the multisig's derived authority.")]
    InvalidDerivedAuthority = 10,

    #[error("Signer is not in the owner's delegate list.")]
    NotADelegate = 11,

    #[error("Accounts do not match the transaction's action.")]
    TargetAccountMismatch = 12,

    #[error("Owner set changes must be signed by the multisig itself.")]
    UnauthorizedOwnerChange = 13,

    #[error("Account is already initialized.")]
    AccountAlreadyInitialized = 14,

    #[error("Overflow when adding.")]
    Overflow = 15,

    #[error("The owner set changed since this transaction was proposed.")]
    OwnerSetChanged = 16,
}

impl MultisigError {
    const ALL: [MultisigError; 17] = [
        MultisigError::InvalidThreshold,
        MultisigError::NotAnOwner,
        MultisigError::InsufficientApprovals,
        MultisigError::AlreadyExecuted,
        MultisigError::EmptyOwners,
        MultisigError::DuplicateOwners,
        MultisigError::MultisigMismatch,
        MultisigError::InvalidMultisigAddress,
        MultisigError::InvalidTransactionAddress,
        MultisigError::InvalidDelegateListAddress,
        MultisigError::InvalidDerivedAuthority,
        MultisigError::NotADelegate,
        MultisigError::TargetAccountMismatch,
        MultisigError::UnauthorizedOwnerChange,
        MultisigError::AccountAlreadyInitialized,
        MultisigError::Overflow,
        MultisigError::OwnerSetChanged,
    ];

    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.code() == code)
    }
}

impl From<MultisigError> for ProgramError {
    fn from(e: MultisigError) -> Self {
        ProgramError::Custom(e.code())
    }
}
