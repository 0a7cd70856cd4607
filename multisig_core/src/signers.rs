// multisig_core::signers: who approved a transaction, as far as can still be told.
//
// While the owner set is unchanged since proposal, approvals are shown per
// current owner. After a change, the stored identities may no longer line up
// with anyone's role, so only counts are shown.

use nssa_core::account::AccountId;
use serde::{Deserialize, Serialize};

use crate::{MultisigState, TransactionState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerSignature {
    pub owner: AccountId,
    pub did_sign: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignersView {
    /// One entry per current owner, in owner-list order.
    Current { signers: Vec<OwnerSignature> },
    /// The owner set changed after proposal.
    Outdated { num_signed: usize, num_owners: usize },
}

impl SignersView {
    pub fn new(transaction: &TransactionState, multisig: &MultisigState) -> Self {
        if transaction.is_outdated(multisig) {
            return SignersView::Outdated {
                num_signed: transaction.signers.len(),
                num_owners: transaction.owner_count as usize,
            };
        }
        SignersView::Current {
            signers: multisig
                .owners
                .iter()
                .map(|owner| OwnerSignature {
                    owner: *owner,
                    did_sign: transaction.has_signed(owner),
                })
                .collect(),
        }
    }
}
