// ledger_core::account: signer keys and account helpers.

use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use nssa_core::account::{Account, AccountId, AccountWithMetadata};
use sha2::{Digest, Sha256};

use crate::error::ProgramError;

const USER_ACCOUNT_PREFIX: &[u8] = b"/ledger/user/";

/// Identity key of a transaction signer. Holding the matching private key is
/// the wallet's concern; the ledger only sees the public half.
#[derive(Clone, Copy, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    pub const fn new(value: [u8; 32]) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &[u8; 32] {
        &self.0
    }

    /// User accounts are addressed by the hash of their public key. The
    /// prefix keeps them out of the PDA address space.
    pub fn account_id(&self) -> AccountId {
        let digest: [u8; 32] = Sha256::new()
            .chain_update(USER_ACCOUNT_PREFIX)
            .chain_update(self.0)
            .finalize()
            .into();
        AccountId::new(digest)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.0))
    }
}

/// `Account::default()` is the uninitialized account.
pub fn is_uninitialized(account: &Account) -> bool {
    *account == Account::default()
}

pub fn account_data(account: &Account) -> Vec<u8> {
    account.data.clone().into()
}

pub fn require_signer(account: &AccountWithMetadata) -> Result<(), ProgramError> {
    if account.is_authorized {
        Ok(())
    } else {
        Err(ProgramError::MissingRequiredSignature(account.account_id))
    }
}
