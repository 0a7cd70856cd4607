use ledger_core::ProgramError;
use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoaderError {
    #[error("authority did not sign")]
    MissingAuthoritySignature = 0,

    #[error("incorrect authority provided")]
    IncorrectAuthority = 1,

    #[error("account is immutable")]
    Immutable = 2,

    #[error("account is not a program")]
    NotAProgram = 3,

    #[error("account is not program data")]
    NotProgramData = 4,

    #[error("account is not a buffer")]
    NotABuffer = 5,

    #[error("program data does not belong to the program")]
    ProgramDataMismatch = 6,

    #[error("account is already initialized")]
    AccountAlreadyInitialized = 7,
}

impl LoaderError {
    const ALL: [LoaderError; 8] = [
        LoaderError::MissingAuthoritySignature,
        LoaderError::IncorrectAuthority,
        LoaderError::Immutable,
        LoaderError::NotAProgram,
        LoaderError::NotProgramData,
        LoaderError::NotABuffer,
        LoaderError::ProgramDataMismatch,
        LoaderError::AccountAlreadyInitialized,
    ];

    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.code() == code)
    }
}

impl From<LoaderError> for ProgramError {
    fn from(e: LoaderError) -> Self {
        ProgramError::Custom(e.code())
    }
}
