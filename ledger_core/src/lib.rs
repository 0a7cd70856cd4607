// ledger_core: the contract between the in-process ledger and the programs
// that run on it.
//
// Account, post-state and chained-call types come from `nssa_core`. This crate
// adds what the ledger needs on top: the `Program` trait, program errors,
// signer keys, and the borsh state helpers every handler uses.

pub mod account;
pub mod error;
pub mod program;

pub use account::{PublicKey, account_data, is_uninitialized, require_signer};
pub use error::ProgramError;
pub use program::{
    Program, ProgramResult, display_program_id, instruction_bytes, instruction_words,
    program_id_from_name, program_id_to_bytes, read_state, require_accounts, write_state,
};
