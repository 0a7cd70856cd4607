// multisig_core: shared types and PDA derivation helpers for the Multisig program.
//
// Modelled on the Serum multisig: owners propose transactions, each stored in
// its own account, approve them independently, and anyone executes once the
// threshold is met. The action runs signed by the multisig's derived
// authority, a PDA no one holds a key for.

pub mod error;
pub mod signers;

use borsh::{BorshDeserialize, BorshSerialize};
use nssa_core::account::AccountId;
use nssa_core::program::{PdaSeed, ProgramId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub use error::MultisigError;
pub use signers::{OwnerSignature, SignersView};

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

/// Instructions for the M-of-N multisig program.
///
/// Flow:
/// 1. An owner calls `CreateTransaction` with an action: creates the transaction account
/// 2. Other owners call `Approve`: adds their approval
/// 3. Once `threshold` current owners approved, anyone calls `ExecuteTransaction`
/// 4. Owner-set changes are ordinary actions targeting this program, so they
///    go through the same pipeline
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum Instruction {
    /// Create a new multisig.
    ///
    /// Accounts:
    /// 0. `multisig`: PDA of `create_key`, uninitialized
    CreateMultisig {
        create_key: [u8; 32],
        owners: Vec<AccountId>,
        threshold: u64,
    },

    /// Propose an action. The proposer's approval is recorded immediately.
    ///
    /// Accounts:
    /// 0. `multisig`
    /// 1. `proposer`: signer; an owner, or a delegate of one
    /// 2. `transaction`: PDA of (`multisig`, `create_key`), uninitialized
    /// 3. `delegate_list`: optional; present when `proposer` acts as a delegate
    CreateTransaction {
        create_key: [u8; 32],
        action: TransactionAction,
    },

    /// Approve a transaction as an owner.
    ///
    /// Accounts:
    /// 0. `multisig`
    /// 1. `owner`: signer
    /// 2. `transaction`
    Approve,

    /// Approve a transaction on behalf of the owner of `delegate_list`.
    ///
    /// Accounts:
    /// 0. `multisig`
    /// 1. `delegate`: signer, listed in `delegate_list`
    /// 2. `transaction`
    /// 3. `delegate_list`
    DelegateApprove,

    /// Run an approved transaction signed by the derived authority.
    ///
    /// Accounts:
    /// 0. `multisig`
    /// 1. `multisig_signer`: the derived authority
    /// 2. `transaction`
    /// 3.. every account of the action not already listed above
    ExecuteTransaction,

    /// Replace the owner list. Clamps the threshold to the new owner count.
    ///
    /// Accounts:
    /// 0. `multisig`
    /// 1. `multisig_signer`: must be authorized
    SetOwners { owners: Vec<AccountId> },

    /// Accounts as for `SetOwners`.
    ChangeThreshold { threshold: u64 },

    /// Accounts as for `SetOwners`.
    SetOwnersAndChangeThreshold {
        owners: Vec<AccountId>,
        threshold: u64,
    },

    /// Publish the addresses allowed to act for an owner.
    ///
    /// Accounts:
    /// 0. `multisig`
    /// 1. `owner`: signer, a current owner
    /// 2. `delegate_list`: PDA of (`multisig`, `owner`), uninitialized
    CreateDelegateList { delegates: Vec<AccountId> },

    /// Accounts:
    /// 0. `multisig`
    /// 1. `authority`: signer; the list's owner or the multisig signer
    /// 2. `delegate_list`
    SetDelegateList { delegates: Vec<AccountId> },
}

/// The privileged action a transaction performs once executed.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct TransactionAction {
    /// Program to invoke.
    pub program_id: ProgramId,
    /// Accounts passed to the program, in order. Occurrences of the
    /// multisig's derived authority are passed authorized.
    pub accounts: Vec<AccountId>,
    /// Borsh-encoded instruction for `program_id`.
    pub data: Vec<u8>,
}

impl TransactionAction {
    pub fn new<I: BorshSerialize>(
        program_id: ProgramId,
        accounts: Vec<AccountId>,
        instruction: &I,
    ) -> std::io::Result<Self> {
        Ok(Self {
            program_id,
            accounts,
            data: borsh::to_vec(instruction)?,
        })
    }

    /// Action replacing owners and threshold of `multisig` in one step.
    pub fn owner_set_change(
        program_id: &ProgramId,
        multisig: &AccountId,
        owners: Vec<AccountId>,
        threshold: u64,
    ) -> std::io::Result<Self> {
        let authority = DerivedAuthority::new(program_id, multisig);
        Self::new(
            *program_id,
            vec![*multisig, authority.address()],
            &Instruction::SetOwnersAndChangeThreshold { owners, threshold },
        )
    }

    /// The multisig instruction this action carries, if it targets the
    /// multisig program itself.
    pub fn multisig_instruction(&self, program_id: &ProgramId) -> Option<Instruction> {
        if self.program_id != *program_id {
            return None;
        }
        borsh::from_slice(&self.data).ok()
    }
}

// ---------------------------------------------------------------------------
// Multisig state (persisted in the multisig PDA)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct MultisigState {
    /// Key the multisig address was derived from.
    pub create_key: [u8; 32],
    /// Owner identities. Order is kept for display only.
    pub owners: Vec<AccountId>,
    /// Approvals required to execute (M).
    pub threshold: u64,
    /// Bumped once per owner-set change.
    pub owner_set_seqno: u32,
}

impl MultisigState {
    pub fn new(
        create_key: [u8; 32],
        owners: Vec<AccountId>,
        threshold: u64,
    ) -> Result<Self, MultisigError> {
        validate_owner_set(&owners, threshold)?;
        Ok(Self {
            create_key,
            owners,
            threshold,
            owner_set_seqno: 0,
        })
    }

    pub fn is_owner(&self, id: &AccountId) -> bool {
        self.owners.contains(id)
    }

    /// Count how many of the given signers are current owners
    pub fn count_valid_signers(&self, signers: &[AccountId]) -> usize {
        signers.iter().filter(|s| self.is_owner(s)).count()
    }

    pub fn has_threshold(&self, signers: &[AccountId]) -> bool {
        self.count_valid_signers(signers) as u64 >= self.threshold
    }

    pub fn set_owners(&mut self, owners: Vec<AccountId>) -> Result<(), MultisigError> {
        assert_unique_owners(&owners)?;
        if owners.is_empty() {
            return Err(MultisigError::EmptyOwners);
        }
        let seqno = self.next_seqno()?;
        if (owners.len() as u64) < self.threshold {
            self.threshold = owners.len() as u64;
        }
        self.owners = owners;
        self.owner_set_seqno = seqno;
        Ok(())
    }

    pub fn change_threshold(&mut self, threshold: u64) -> Result<(), MultisigError> {
        validate_threshold(threshold, self.owners.len())?;
        self.threshold = threshold;
        Ok(())
    }

    /// Replace owners and threshold together; the seqno moves by exactly one.
    pub fn set_owners_and_change_threshold(
        &mut self,
        owners: Vec<AccountId>,
        threshold: u64,
    ) -> Result<(), MultisigError> {
        validate_owner_set(&owners, threshold)?;
        self.owner_set_seqno = self.next_seqno()?;
        self.owners = owners;
        self.threshold = threshold;
        Ok(())
    }

    fn next_seqno(&self) -> Result<u32, MultisigError> {
        self.owner_set_seqno
            .checked_add(1)
            .ok_or(MultisigError::Overflow)
    }
}

pub fn assert_unique_owners(owners: &[AccountId]) -> Result<(), MultisigError> {
    for (i, owner) in owners.iter().enumerate() {
        if owners[i + 1..].contains(owner) {
            return Err(MultisigError::DuplicateOwners);
        }
    }
    Ok(())
}

pub fn validate_threshold(threshold: u64, owner_count: usize) -> Result<(), MultisigError> {
    if threshold == 0 || threshold > owner_count as u64 {
        return Err(MultisigError::InvalidThreshold);
    }
    Ok(())
}

/// Owners must be unique and non-empty, and `1 <= threshold <= owners.len()`.
pub fn validate_owner_set(owners: &[AccountId], threshold: u64) -> Result<(), MultisigError> {
    assert_unique_owners(owners)?;
    if owners.is_empty() {
        return Err(MultisigError::EmptyOwners);
    }
    validate_threshold(threshold, owners.len())
}

// ---------------------------------------------------------------------------
// Transaction state (one account per proposal)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct TransactionState {
    /// The multisig this transaction belongs to.
    pub multisig: AccountId,
    /// Owner on whose behalf the transaction was proposed.
    pub proposer: AccountId,
    pub action: TransactionAction,
    /// Owners that approved, in approval order. Never rewritten on owner-set
    /// changes; only interpreted against the current owners.
    pub signers: Vec<AccountId>,
    pub did_execute: bool,
    /// Multisig seqno at proposal time.
    pub owner_set_seqno: u32,
    /// Multisig owner count at proposal time.
    pub owner_count: u32,
}

impl TransactionState {
    pub fn new(
        multisig: AccountId,
        proposer: AccountId,
        action: TransactionAction,
        state: &MultisigState,
    ) -> Self {
        Self {
            multisig,
            proposer,
            action,
            signers: vec![proposer], // proposer auto-approves
            did_execute: false,
            owner_set_seqno: state.owner_set_seqno,
            owner_count: state.owners.len() as u32,
        }
    }

    pub fn has_signed(&self, owner: &AccountId) -> bool {
        self.signers.contains(owner)
    }

    /// Add an approval. Returns true if this was a new approval.
    pub fn approve(&mut self, owner: AccountId) -> bool {
        if self.has_signed(&owner) {
            return false;
        }
        self.signers.push(owner);
        true
    }

    /// Whether the owner set changed since this transaction was proposed.
    pub fn is_outdated(&self, state: &MultisigState) -> bool {
        self.owner_set_seqno != state.owner_set_seqno
    }
}

// ---------------------------------------------------------------------------
// Delegates
// ---------------------------------------------------------------------------

/// Addresses allowed to propose and approve on behalf of one owner.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct DelegateList {
    pub multisig: AccountId,
    pub owner: AccountId,
    pub delegates: Vec<AccountId>,
}

impl DelegateList {
    pub fn is_delegate(&self, id: &AccountId) -> bool {
        self.delegates.contains(id)
    }
}

// ---------------------------------------------------------------------------
// PDA derivation helpers
// ---------------------------------------------------------------------------

const MULTISIG_STATE_TAG: &[u8] = b"multisig_state";
const MULTISIG_SIGNER_TAG: &[u8] = b"multisig_signer";
const TRANSACTION_TAG: &[u8] = b"multisig_transaction";
const DELEGATE_LIST_TAG: &[u8] = b"multisig_delegates";

fn tagged_seed(tag: &[u8], parts: &[&[u8; 32]]) -> PdaSeed {
    PdaSeed::new(tagged_digest(tag, parts))
}

fn tagged_digest(tag: &[u8], parts: &[&[u8; 32]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(tag);
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

pub fn multisig_pda_seed(create_key: &[u8; 32]) -> PdaSeed {
    tagged_seed(MULTISIG_STATE_TAG, &[create_key])
}

pub fn compute_multisig_pda(program_id: &ProgramId, create_key: &[u8; 32]) -> AccountId {
    AccountId::from((program_id, &multisig_pda_seed(create_key)))
}

pub fn multisig_signer_pda_seed(multisig: &AccountId) -> PdaSeed {
    tagged_seed(MULTISIG_SIGNER_TAG, &[multisig.value()])
}

pub fn compute_multisig_signer_pda(program_id: &ProgramId, multisig: &AccountId) -> AccountId {
    AccountId::from((program_id, &multisig_signer_pda_seed(multisig)))
}

pub fn transaction_pda_seed(multisig: &AccountId, create_key: &[u8; 32]) -> PdaSeed {
    tagged_seed(TRANSACTION_TAG, &[multisig.value(), create_key])
}

pub fn compute_transaction_pda(
    program_id: &ProgramId,
    multisig: &AccountId,
    create_key: &[u8; 32],
) -> AccountId {
    AccountId::from((program_id, &transaction_pda_seed(multisig, create_key)))
}

pub fn delegate_list_pda_seed(multisig: &AccountId, owner: &AccountId) -> PdaSeed {
    tagged_seed(DELEGATE_LIST_TAG, &[multisig.value(), owner.value()])
}

pub fn compute_delegate_list_pda(
    program_id: &ProgramId,
    multisig: &AccountId,
    owner: &AccountId,
) -> AccountId {
    AccountId::from((program_id, &delegate_list_pda_seed(multisig, owner)))
}

/// Capability to act as a multisig's derived authority.
///
/// Holding the seed only matters to the multisig program: the ledger honours
/// it solely in chained calls made by the program the address is derived
/// under, so no key for `address` exists anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedAuthority {
    address: AccountId,
    seed: [u8; 32],
}

impl DerivedAuthority {
    pub fn new(program_id: &ProgramId, multisig: &AccountId) -> Self {
        let seed = tagged_digest(MULTISIG_SIGNER_TAG, &[multisig.value()]);
        Self {
            address: AccountId::from((program_id, &PdaSeed::new(seed))),
            seed,
        }
    }

    pub fn address(&self) -> AccountId {
        self.address
    }

    pub fn seed(&self) -> PdaSeed {
        PdaSeed::new(self.seed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::program_id_from_name;

    fn owner(n: u8) -> AccountId {
        AccountId::new([n; 32])
    }

    fn sample_state() -> MultisigState {
        MultisigState::new([0u8; 32], vec![owner(1), owner(2), owner(3)], 2).unwrap()
    }

    #[test]
    fn test_new_multisig_starts_at_seqno_zero() {
        let state = sample_state();
        assert_eq!(state.owner_set_seqno, 0);
        assert_eq!(state.threshold, 2);
    }

    #[test]
    fn test_threshold_bounds() {
        let owners = vec![owner(1), owner(2)];
        assert_eq!(
            MultisigState::new([0u8; 32], owners.clone(), 0),
            Err(MultisigError::InvalidThreshold)
        );
        assert_eq!(
            MultisigState::new([0u8; 32], owners.clone(), 3),
            Err(MultisigError::InvalidThreshold)
        );
        assert!(MultisigState::new([0u8; 32], owners, 2).is_ok());
    }

    #[test]
    fn test_owners_must_be_unique_and_present() {
        assert_eq!(
            MultisigState::new([0u8; 32], vec![owner(1), owner(1)], 1),
            Err(MultisigError::DuplicateOwners)
        );
        assert_eq!(
            MultisigState::new([0u8; 32], vec![], 1),
            Err(MultisigError::EmptyOwners)
        );
    }

    #[test]
    fn test_count_valid_signers_ignores_non_owners() {
        let state = sample_state();
        let signers = vec![owner(1), owner(9), owner(3)];
        assert_eq!(state.count_valid_signers(&signers), 2);
        assert!(state.has_threshold(&signers));
        assert!(!state.has_threshold(&[owner(9), owner(2)]));
    }

    #[test]
    fn test_set_owners_clamps_threshold_and_bumps_seqno() {
        let mut state = sample_state();
        state.change_threshold(3).unwrap();
        state.set_owners(vec![owner(1), owner(2)]).unwrap();
        assert_eq!(state.threshold, 2);
        assert_eq!(state.owner_set_seqno, 1);
    }

    #[test]
    fn test_change_threshold_keeps_seqno() {
        let mut state = sample_state();
        state.change_threshold(1).unwrap();
        assert_eq!(state.owner_set_seqno, 0);
        assert_eq!(state.change_threshold(4), Err(MultisigError::InvalidThreshold));
    }

    #[test]
    fn test_set_owners_and_change_threshold_is_all_or_nothing() {
        let mut state = sample_state();
        assert_eq!(
            state.set_owners_and_change_threshold(vec![owner(1)], 2),
            Err(MultisigError::InvalidThreshold)
        );
        assert_eq!(state, sample_state());

        state
            .set_owners_and_change_threshold(vec![owner(1), owner(4)], 1)
            .unwrap();
        assert_eq!(state.owners, vec![owner(1), owner(4)]);
        assert_eq!(state.threshold, 1);
        assert_eq!(state.owner_set_seqno, 1);
    }

    #[test]
    fn test_transaction_proposer_auto_approves() {
        let state = sample_state();
        let action = TransactionAction {
            program_id: [0; 8],
            accounts: vec![],
            data: vec![],
        };
        let mut tx = TransactionState::new(owner(0), owner(1), action, &state);
        assert_eq!(tx.signers, vec![owner(1)]);
        assert_eq!(tx.owner_count, 3);
        assert!(tx.approve(owner(2)));
        assert!(!tx.approve(owner(2)));
        assert_eq!(tx.signers, vec![owner(1), owner(2)]);
    }

    #[test]
    fn test_pda_derivations_are_distinct() {
        let program_id = program_id_from_name("multisig");
        let key = [5u8; 32];
        let multisig = compute_multisig_pda(&program_id, &key);
        let signer = compute_multisig_signer_pda(&program_id, &multisig);
        let transaction = compute_transaction_pda(&program_id, &multisig, &key);
        let delegates = compute_delegate_list_pda(&program_id, &multisig, &owner(1));
        let all = [multisig, signer, transaction, delegates];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_derived_authority_is_per_multisig() {
        let program_id = program_id_from_name("multisig");
        let a = DerivedAuthority::new(&program_id, &owner(1));
        let b = DerivedAuthority::new(&program_id, &owner(2));
        assert_ne!(a.address(), b.address());
        assert_eq!(a.address(), compute_multisig_signer_pda(&program_id, &owner(1)));
        assert_eq!(a, DerivedAuthority::new(&program_id, &owner(1)));
    }

    #[test]
    fn test_owner_set_change_action_decodes() {
        let program_id = program_id_from_name("multisig");
        let multisig = owner(7);
        let action =
            TransactionAction::owner_set_change(&program_id, &multisig, vec![owner(1)], 1).unwrap();
        assert_eq!(
            action.accounts,
            vec![multisig, compute_multisig_signer_pda(&program_id, &multisig)]
        );
        assert_eq!(
            action.multisig_instruction(&program_id),
            Some(Instruction::SetOwnersAndChangeThreshold {
                owners: vec![owner(1)],
                threshold: 1
            })
        );
        assert_eq!(action.multisig_instruction(&program_id_from_name("other")), None);
    }
}
