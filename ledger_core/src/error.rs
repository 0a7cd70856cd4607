use thiserror::Error;

use nssa_core::account::AccountId;

/// Failure reported by a program. Program-specific errors travel as
/// `Custom` codes and are decoded by whoever knows the program.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgramError {
    #[error("instruction data could not be decoded")]
    InvalidInstructionData,

    #[error("instruction requires {expected} accounts, got {actual}")]
    NotEnoughAccounts { expected: usize, actual: usize },

    #[error("account {0} must sign")]
    MissingRequiredSignature(AccountId),

    #[error("account {0} is not owned by this program")]
    IllegalOwner(AccountId),

    #[error("account {0} holds data this program cannot decode")]
    InvalidAccountData(AccountId),

    #[error("account data could not be serialized")]
    SerializationFailed,

    #[error("account data exceeds the maximum account size")]
    DataTooLarge,

    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    #[error("program error code {0}")]
    Custom(u32),
}
