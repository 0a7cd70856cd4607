// ledger_core::program: the program trait, program ids and handler helpers.

use borsh::{BorshDeserialize, BorshSerialize};
use nssa_core::account::{Account, AccountWithMetadata};
use nssa_core::program::{AccountPostState, ChainedCall, ProgramId};
use sha2::{Digest, Sha256};

use crate::account::account_data;
use crate::error::ProgramError;

const PROGRAM_ID_PREFIX: &[u8] = b"/ledger/program/";

/// Derive a program id from a program name.
pub fn program_id_from_name(name: &str) -> ProgramId {
    let digest: [u8; 32] = Sha256::new()
        .chain_update(PROGRAM_ID_PREFIX)
        .chain_update(name.as_bytes())
        .finalize()
        .into();
    let mut id = [0u32; 8];
    for (word, chunk) in id.iter_mut().zip(digest.chunks_exact(4)) {
        *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    id
}

/// Convert a `ProgramId` ([u32; 8]) to a canonical 32-byte big-endian representation.
pub fn program_id_to_bytes(program_id: &ProgramId) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    for (i, word) in program_id.iter().enumerate() {
        bytes[i * 4..(i + 1) * 4].copy_from_slice(&word.to_be_bytes());
    }
    bytes
}

pub fn display_program_id(program_id: &ProgramId) -> String {
    hex::encode(program_id_to_bytes(program_id))
}

/// Pack instruction bytes into the word layout of `ChainedCall::instruction_data`:
/// the byte length, then the bytes as little-endian words, zero padded.
pub fn instruction_words(bytes: &[u8]) -> Vec<u32> {
    let mut words = Vec::with_capacity(1 + bytes.len().div_ceil(4));
    words.push(bytes.len() as u32);
    words.extend(bytes.chunks(4).map(|chunk| {
        let mut buf = [0u8; 4];
        buf[..chunk.len()].copy_from_slice(chunk);
        u32::from_le_bytes(buf)
    }));
    words
}

/// Inverse of [`instruction_words`]. `None` if the length word disagrees
/// with the payload.
pub fn instruction_bytes(words: &[u32]) -> Option<Vec<u8>> {
    let (len, body) = words.split_first()?;
    let len = usize::try_from(*len).ok()?;
    if body.len() != len.div_ceil(4) {
        return None;
    }
    let mut bytes: Vec<u8> = body.iter().flat_map(|word| word.to_le_bytes()).collect();
    bytes.truncate(len);
    Some(bytes)
}

/// What a handler returns: one post state per pre state, plus the calls to
/// make on the program's behalf once those are applied.
pub type ProgramResult = Result<(Vec<AccountPostState>, Vec<ChainedCall>), ProgramError>;

/// A program the ledger can run.
pub trait Program: Send + Sync {
    fn id(&self) -> ProgramId;

    fn execute(&self, pre_states: &[AccountWithMetadata], instruction_data: &[u8])
    -> ProgramResult;
}

// ---------------------------------------------------------------------------
// Handler helpers
// ---------------------------------------------------------------------------

pub fn require_accounts(
    accounts: &[AccountWithMetadata],
    expected: usize,
) -> Result<(), ProgramError> {
    if accounts.len() < expected {
        return Err(ProgramError::NotEnoughAccounts {
            expected,
            actual: accounts.len(),
        });
    }
    Ok(())
}

/// Decode the state of an account that must be owned by `owner`.
pub fn read_state<T: BorshDeserialize>(
    account: &AccountWithMetadata,
    owner: &ProgramId,
) -> Result<T, ProgramError> {
    if account.account.program_owner != *owner {
        return Err(ProgramError::IllegalOwner(account.account_id));
    }
    borsh::from_slice(&account_data(&account.account))
        .map_err(|_| ProgramError::InvalidAccountData(account.account_id))
}

/// Copy of `account` with its data replaced by `state`.
pub fn write_state<T: BorshSerialize>(account: &Account, state: &T) -> Result<Account, ProgramError> {
    let bytes = borsh::to_vec(state).map_err(|_| ProgramError::SerializationFailed)?;
    let mut account = account.clone();
    account.data = bytes.try_into().map_err(|_| ProgramError::DataTooLarge)?;
    Ok(account)
}
