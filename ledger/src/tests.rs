use borsh::{BorshDeserialize, BorshSerialize};
use ledger_core::{
    Program, ProgramError, ProgramResult, PublicKey, account_data, instruction_words,
    program_id_from_name, require_signer,
};
use nssa_core::account::{Account, AccountId, AccountWithMetadata};
use nssa_core::program::{AccountPostState, ChainedCall, PdaSeed, ProgramId};

use super::*;

#[derive(BorshSerialize, BorshDeserialize)]
enum TestInstruction {
    Claim { data: Vec<u8> },
    Write { data: Vec<u8> },
    Transfer { amount: u128 },
    Mint { amount: u128 },
    RequireSigner,
    BumpNonce,
    Chain {
        claim: Option<Vec<u8>>,
        program_id: ProgramId,
        instruction: Vec<u8>,
        authorize: bool,
        seed: Option<[u8; 32]>,
    },
    Fail,
}

struct TestProgram {
    id: ProgramId,
}

impl TestProgram {
    fn named(name: &str) -> Self {
        Self {
            id: program_id_from_name(name),
        }
    }
}

fn with_data(account: &Account, data: Vec<u8>) -> Account {
    let mut account = account.clone();
    account.data = data.try_into().unwrap();
    account
}

fn owned_by(program_id: ProgramId, balance: u128) -> Account {
    let mut account = Account::default();
    account.program_owner = program_id;
    account.balance = balance;
    account
}

fn unchanged(accounts: &[AccountWithMetadata]) -> Vec<AccountPostState> {
    accounts
        .iter()
        .map(|a| AccountPostState::new(a.account.clone()))
        .collect()
}

impl Program for TestProgram {
    fn id(&self) -> ProgramId {
        self.id
    }

    fn execute(&self, accounts: &[AccountWithMetadata], data: &[u8]) -> ProgramResult {
        let instruction: TestInstruction =
            borsh::from_slice(data).map_err(|_| ProgramError::InvalidInstructionData)?;
        let mut posts = unchanged(accounts);
        let mut calls = vec![];

        match instruction {
            TestInstruction::Claim { data } => {
                posts[0] = AccountPostState::new_claimed(with_data(&accounts[0].account, data));
            }
            TestInstruction::Write { data } => {
                posts[0] = AccountPostState::new(with_data(&accounts[0].account, data));
            }
            TestInstruction::Transfer { amount } => {
                let mut from = accounts[0].account.clone();
                let mut to = accounts[1].account.clone();
                from.balance = from
                    .balance
                    .checked_sub(amount)
                    .ok_or(ProgramError::ArithmeticOverflow)?;
                to.balance += amount;
                posts[0] = AccountPostState::new(from);
                posts[1] = AccountPostState::new(to);
            }
            TestInstruction::Mint { amount } => {
                let mut account = accounts[0].account.clone();
                account.balance += amount;
                posts[0] = AccountPostState::new(account);
            }
            TestInstruction::RequireSigner => require_signer(&accounts[0])?,
            TestInstruction::BumpNonce => {
                let mut account = accounts[0].account.clone();
                account.nonce += 1;
                posts[0] = AccountPostState::new(account);
            }
            TestInstruction::Chain {
                claim,
                program_id,
                instruction,
                authorize,
                seed,
            } => {
                if let Some(data) = claim {
                    posts[0] = AccountPostState::new_claimed(with_data(&Account::default(), data));
                }
                let mut pre_states = accounts.to_vec();
                pre_states[0].is_authorized = authorize;
                calls.push(ChainedCall {
                    program_id,
                    instruction_data: instruction_words(&instruction),
                    pre_states,
                    pda_seeds: seed.map(PdaSeed::new).into_iter().collect(),
                });
            }
            TestInstruction::Fail => return Err(ProgramError::Custom(7)),
        }

        Ok((posts, calls))
    }
}

fn encode(instruction: &TestInstruction) -> Vec<u8> {
    borsh::to_vec(instruction).unwrap()
}

fn setup(config: LedgerConfig) -> (Ledger, ProgramId, ProgramId) {
    let mut ledger = Ledger::new(config);
    let alpha = ledger.register_program(TestProgram::named("alpha")).unwrap();
    let beta = ledger.register_program(TestProgram::named("beta")).unwrap();
    (ledger, alpha, beta)
}

fn tx(
    program_id: ProgramId,
    account_ids: Vec<AccountId>,
    signers: Vec<PublicKey>,
    instruction: &TestInstruction,
) -> Transaction {
    Transaction::try_new(program_id, account_ids, signers, instruction).unwrap()
}

#[test]
fn test_claim_assigns_owner() {
    let (mut ledger, alpha, _) = setup(LedgerConfig::default());
    let id = AccountId::new([1u8; 32]);

    ledger
        .submit(&tx(alpha, vec![id], vec![], &TestInstruction::Claim { data: vec![1, 2] }))
        .unwrap();

    let account = ledger.account(&id);
    assert_eq!(account.program_owner, alpha);
    assert_eq!(account_data(&account), vec![1, 2]);
}

#[test]
fn test_claiming_initialized_account_fails() {
    let (mut ledger, alpha, beta) = setup(LedgerConfig::default());
    let id = AccountId::new([1u8; 32]);
    ledger
        .submit(&tx(alpha, vec![id], vec![], &TestInstruction::Claim { data: vec![1] }))
        .unwrap();

    let result = ledger.submit(&tx(beta, vec![id], vec![], &TestInstruction::Claim { data: vec![2] }));

    assert!(matches!(result, Err(LedgerError::InvalidClaim(a)) if a == id));
    assert_eq!(ledger.account(&id).program_owner, alpha);
}

#[test]
fn test_write_to_unowned_account_is_rejected() {
    let (mut ledger, alpha, beta) = setup(LedgerConfig::default());
    let id = AccountId::new([1u8; 32]);
    ledger
        .submit(&tx(alpha, vec![id], vec![], &TestInstruction::Claim { data: vec![1] }))
        .unwrap();

    let result = ledger.submit(&tx(beta, vec![id], vec![], &TestInstruction::Write { data: vec![9] }));

    assert!(matches!(result, Err(LedgerError::IllegalDataModification(a)) if a == id));
    assert_eq!(account_data(&ledger.account(&id)), vec![1]);
}

#[test]
fn test_owner_can_rewrite_its_account() {
    let (mut ledger, alpha, _) = setup(LedgerConfig::default());
    let id = AccountId::new([1u8; 32]);
    ledger
        .submit(&tx(alpha, vec![id], vec![], &TestInstruction::Claim { data: vec![1] }))
        .unwrap();

    ledger
        .submit(&tx(alpha, vec![id], vec![], &TestInstruction::Write { data: vec![5, 5] }))
        .unwrap();

    assert_eq!(account_data(&ledger.account(&id)), vec![5, 5]);
}

#[test]
fn test_failed_chained_call_rolls_back_caller() {
    let (mut ledger, alpha, beta) = setup(LedgerConfig::default());
    let id = AccountId::new([1u8; 32]);

    let result = ledger.submit(&tx(
        alpha,
        vec![id],
        vec![],
        &TestInstruction::Chain {
            claim: Some(vec![1]),
            program_id: beta,
            instruction: encode(&TestInstruction::Fail),
            authorize: false,
            seed: None,
        },
    ));

    match result {
        Err(LedgerError::Program {
            program_id,
            depth,
            error,
        }) => {
            assert_eq!(program_id, beta);
            assert_eq!(depth, 1);
            assert_eq!(error, ProgramError::Custom(7));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(ledger.get_account(&id).is_none());
}

#[test]
fn test_chained_call_may_authorize_own_pda() {
    let (mut ledger, alpha, beta) = setup(LedgerConfig::default());
    let seed = [4u8; 32];
    let pda = AccountId::from((&alpha, &PdaSeed::new(seed)));

    let result = ledger.submit(&tx(
        alpha,
        vec![pda],
        vec![],
        &TestInstruction::Chain {
            claim: None,
            program_id: beta,
            instruction: encode(&TestInstruction::RequireSigner),
            authorize: true,
            seed: Some(seed),
        },
    ));

    assert!(result.is_ok(), "{result:?}");
}

#[test]
fn test_chained_call_cannot_authorize_foreign_pda() {
    let (mut ledger, alpha, beta) = setup(LedgerConfig::default());
    let seed = [4u8; 32];
    // PDA of beta, not of the caller alpha.
    let pda = AccountId::from((&beta, &PdaSeed::new(seed)));

    let result = ledger.submit(&tx(
        alpha,
        vec![pda],
        vec![],
        &TestInstruction::Chain {
            claim: None,
            program_id: beta,
            instruction: encode(&TestInstruction::RequireSigner),
            authorize: true,
            seed: Some(seed),
        },
    ));

    assert!(matches!(result, Err(LedgerError::UnauthorizedChainedAccount(a)) if a == pda));
}

#[test]
fn test_signer_authorization_is_inherited() {
    let (mut ledger, alpha, beta) = setup(LedgerConfig::default());
    let key = PublicKey::new([8u8; 32]);

    let result = ledger.submit(&tx(
        alpha,
        vec![key.account_id()],
        vec![key],
        &TestInstruction::Chain {
            claim: None,
            program_id: beta,
            instruction: encode(&TestInstruction::RequireSigner),
            authorize: true,
            seed: None,
        },
    ));

    assert!(result.is_ok(), "{result:?}");
}

#[test]
fn test_unsigned_account_is_not_authorized() {
    let (mut ledger, alpha, _) = setup(LedgerConfig::default());
    let key = PublicKey::new([8u8; 32]);

    let result = ledger.submit(&tx(alpha, vec![key.account_id()], vec![], &TestInstruction::RequireSigner));

    assert!(matches!(
        result,
        Err(LedgerError::Program {
            error: ProgramError::MissingRequiredSignature(_),
            ..
        })
    ));
}

#[test]
fn test_duplicate_accounts_are_rejected() {
    let (mut ledger, alpha, _) = setup(LedgerConfig::default());
    let id = AccountId::new([1u8; 32]);

    let result = ledger.submit(&tx(alpha, vec![id, id], vec![], &TestInstruction::Transfer { amount: 0 }));

    assert!(matches!(result, Err(LedgerError::DuplicateAccount(a)) if a == id));
}

#[test]
fn test_call_depth_limit() {
    let (mut ledger, alpha, beta) = setup(LedgerConfig {
        max_call_depth: 1,
        ..LedgerConfig::default()
    });
    let id = AccountId::new([1u8; 32]);
    let innermost = TestInstruction::Write { data: vec![] };
    let middle = TestInstruction::Chain {
        claim: None,
        program_id: alpha,
        instruction: encode(&innermost),
        authorize: false,
        seed: None,
    };
    let outer = TestInstruction::Chain {
        claim: None,
        program_id: beta,
        instruction: encode(&middle),
        authorize: false,
        seed: None,
    };

    let result = ledger.submit(&tx(alpha, vec![id], vec![], &outer));

    assert!(matches!(result, Err(LedgerError::CallDepthExceeded(2))));
}

#[test]
fn test_balance_must_be_conserved() {
    let (mut ledger, alpha, _) = setup(LedgerConfig::default());
    let id = AccountId::new([1u8; 32]);

    let result = ledger.submit(&tx(alpha, vec![id], vec![], &TestInstruction::Mint { amount: 5 }));

    assert!(matches!(result, Err(LedgerError::BalanceNotConserved)));
}

#[test]
fn test_owner_may_transfer_balance() {
    let (mut ledger, alpha, _) = setup(LedgerConfig::default());
    let from = AccountId::new([1u8; 32]);
    let to = AccountId::new([2u8; 32]);
    ledger.insert_account(
        from,
        owned_by(alpha, 10),
    );

    ledger
        .submit(&tx(alpha, vec![from, to], vec![], &TestInstruction::Transfer { amount: 4 }))
        .unwrap();

    assert_eq!(ledger.account(&from).balance, 6);
    assert_eq!(ledger.account(&to).balance, 4);
}

#[test]
fn test_debit_of_unowned_account_is_rejected() {
    let (mut ledger, alpha, beta) = setup(LedgerConfig::default());
    let from = AccountId::new([1u8; 32]);
    let to = AccountId::new([2u8; 32]);
    ledger.insert_account(
        from,
        owned_by(alpha, 10),
    );

    let result = ledger.submit(&tx(beta, vec![from, to], vec![], &TestInstruction::Transfer { amount: 4 }));

    assert!(matches!(result, Err(LedgerError::IllegalBalanceDebit(a)) if a == from));
    assert_eq!(ledger.account(&from).balance, 10);
}

#[test]
fn test_data_length_limit() {
    let (mut ledger, alpha, _) = setup(LedgerConfig {
        max_account_data_len: 4,
        ..LedgerConfig::default()
    });
    let id = AccountId::new([1u8; 32]);

    let result = ledger.submit(&tx(alpha, vec![id], vec![], &TestInstruction::Claim { data: vec![0; 5] }));

    assert!(matches!(result, Err(LedgerError::DataTooLarge { len: 5, limit: 4, .. })));
}

#[test]
fn test_unknown_program() {
    let mut ledger = Ledger::default();
    let missing = program_id_from_name("missing");

    let result = ledger.submit(&tx(missing, vec![], vec![], &TestInstruction::Fail));

    assert!(matches!(result, Err(LedgerError::UnknownProgram(p)) if p == missing));
}

#[test]
fn test_program_cannot_be_registered_twice() {
    let (mut ledger, alpha, _) = setup(LedgerConfig::default());

    let result = ledger.register_program(TestProgram::named("alpha"));

    assert!(matches!(result, Err(LedgerError::ProgramAlreadyRegistered(p)) if p == alpha));
}

#[test]
fn test_program_cannot_change_nonce() {
    let (mut ledger, alpha, _) = setup(LedgerConfig::default());
    let id = AccountId::new([1u8; 32]);
    ledger.insert_account(id, owned_by(alpha, 0));

    let result = ledger.submit(&tx(alpha, vec![id], vec![], &TestInstruction::BumpNonce));

    assert!(matches!(result, Err(LedgerError::NonceModified(a)) if a == id));
}

#[test]
fn test_rejection_inside_chained_call_carries_depth() {
    let (mut ledger, alpha, _) = setup(LedgerConfig::default());
    let missing = program_id_from_name("missing");
    let id = AccountId::new([1u8; 32]);

    let result = ledger.submit(&tx(
        alpha,
        vec![id],
        vec![],
        &TestInstruction::Chain {
            claim: None,
            program_id: missing,
            instruction: vec![],
            authorize: false,
            seed: None,
        },
    ));

    let error = result.unwrap_err();
    assert!(error.is_chained());
    match error {
        LedgerError::ChainedCallRejected { depth, error, .. } => {
            assert_eq!(depth, 1);
            assert!(matches!(*error, LedgerError::UnknownProgram(p) if p == missing));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_top_level_failures_are_not_chained() {
    let (mut ledger, alpha, _) = setup(LedgerConfig::default());
    let id = AccountId::new([1u8; 32]);

    let error = ledger
        .submit(&tx(alpha, vec![id], vec![], &TestInstruction::Fail))
        .unwrap_err();
    assert!(!error.is_chained());

    let error = ledger
        .submit(&tx(alpha, vec![id, id], vec![], &TestInstruction::Fail))
        .unwrap_err();
    assert!(!error.is_chained());
}
