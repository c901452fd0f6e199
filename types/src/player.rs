//! Player accounts.

use serde::{Deserialize, Serialize};

/// Verified player identity, supplied by the auth collaborator.
pub type PlayerId = String;

/// Authoritative per-player ledger state.
///
/// The balance is decremented at bet acceptance and incremented at settlement;
/// nothing else may touch it. It can never go negative: a bet that would do so
/// is rejected outright.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub balance: u64,
    pub total_wagered: u64,
    pub total_won: u64,
    pub bet_count: u64,
}

impl Account {
    pub fn with_balance(balance: u64) -> Self {
        Self {
            balance,
            ..Self::default()
        }
    }
}
