//! Shared harness for the end-to-end tests: an in-memory ledger with the
//! multisig and loader programs registered and a handful of owner keys.

use ledger::Ledger;
use ledger_core::{PublicKey, account_data};
use nssa_core::account::AccountId;
use nssa_core::program::ProgramId;
use loader_core::{LoaderState, compute_program_data_pda, genesis_program};
use loader_program::LoaderProgram;
use multisig_client::MultisigClient;
use multisig_program::MultisigProgram;
use tracing_subscriber::EnvFilter;

/// Install a test-friendly subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn key(n: u8) -> PublicKey {
    PublicKey::new([n; 32])
}

pub struct TestEnv {
    pub ledger: Ledger,
    pub multisig_program: ProgramId,
    pub loader_program: ProgramId,
    pub owners: Vec<PublicKey>,
}

impl TestEnv {
    /// Ledger plus `num_owners` owner keys, `key(1)..=key(num_owners)`.
    pub fn new(num_owners: u8) -> Self {
        init_tracing();
        let mut ledger = Ledger::default();
        let multisig_program = ledger
            .register_program(MultisigProgram::new())
            .expect("register multisig");
        let loader_program = ledger
            .register_program(LoaderProgram::new())
            .expect("register loader");
        Self {
            ledger,
            multisig_program,
            loader_program,
            owners: (1..=num_owners).map(key).collect(),
        }
    }

    pub fn client(&mut self) -> MultisigClient<'_> {
        MultisigClient::new(&mut self.ledger, self.multisig_program, self.loader_program)
    }

    pub fn owner(&self, index: usize) -> PublicKey {
        self.owners[index]
    }

    pub fn owner_id(&self, index: usize) -> AccountId {
        self.owners[index].account_id()
    }

    pub fn owner_ids(&self) -> Vec<AccountId> {
        self.owners.iter().map(PublicKey::account_id).collect()
    }

    /// Seed a deployed program at genesis and return its address.
    pub fn deploy_program(
        &mut self,
        program: AccountId,
        upgrade_authority: Option<AccountId>,
        code: Vec<u8>,
    ) -> AccountId {
        let accounts = genesis_program(&self.loader_program, program, upgrade_authority, code)
            .expect("encode program accounts");
        for (id, account) in accounts {
            self.ledger.insert_account(id, account);
        }
        program
    }

    pub fn program_data(&self, program: &AccountId) -> LoaderState {
        let id = compute_program_data_pda(&self.loader_program, program);
        let account = self.ledger.get_account(&id).expect("program data exists");
        borsh::from_slice(&account_data(account)).expect("program data decodes")
    }

    pub fn program_code(&self, program: &AccountId) -> Vec<u8> {
        match self.program_data(program) {
            LoaderState::ProgramData { code, .. } => code,
            other => panic!("expected program data, got {other:?}"),
        }
    }
}
