//! Settlement results.

use serde::{Deserialize, Serialize};

use crate::outcome::Outcome;
use crate::player::PlayerId;

/// Resolution of a single bet against the round outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetResolution {
    pub bet_id: u64,
    pub player: PlayerId,
    pub won: bool,
    /// Winnings credited for this bet (`amount * odds`); zero on a loss. The
    /// stake was debited at placement and is not part of this figure.
    pub payout: u64,
}

/// Per-player aggregate for one settled round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSettlement {
    pub player: PlayerId,
    pub total_wagered: u64,
    pub total_won: u64,
    pub net_result: i64,
    pub new_balance: u64,
}

/// The one-time settlement of a round. Cached by round id so duplicate
/// settlement requests are idempotent no-ops returning the same value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResult {
    pub round_id: u64,
    pub outcome: Outcome,
    pub per_bet: Vec<BetResolution>,
    pub per_player: Vec<PlayerSettlement>,
    pub total_wagered: u64,
    pub total_won: u64,
}

impl SettlementResult {
    /// Result of a round with no bets: all totals zero. Not an error.
    pub fn empty(round_id: u64, outcome: Outcome) -> Self {
        Self {
            round_id,
            outcome,
            per_bet: Vec::new(),
            per_player: Vec::new(),
            total_wagered: 0,
            total_won: 0,
        }
    }

    /// Look up the aggregate for one player, if they had bets in the round.
    pub fn for_player(&self, player: &str) -> Option<&PlayerSettlement> {
        self.per_player.iter().find(|p| p.player == player)
    }
}
