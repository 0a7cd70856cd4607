use serde::{Deserialize, Serialize};

const DEFAULT_MAX_CALL_DEPTH: usize = 4;
const DEFAULT_MAX_ACCOUNT_DATA_LEN: usize = 10 * 1024 * 1024;

/// Runtime limits of a [`crate::Ledger`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Deepest chained call allowed; the top-level call is depth 0.
    #[serde(default = "default_max_call_depth")]
    pub max_call_depth: usize,
    /// Upper bound on the data length of any account.
    #[serde(default = "default_max_account_data_len")]
    pub max_account_data_len: usize,
}

fn default_max_call_depth() -> usize {
    DEFAULT_MAX_CALL_DEPTH
}

fn default_max_account_data_len() -> usize {
    DEFAULT_MAX_ACCOUNT_DATA_LEN
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_account_data_len: DEFAULT_MAX_ACCOUNT_DATA_LEN,
        }
    }
}

impl LedgerConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
