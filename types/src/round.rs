//! Rounds and their lifecycle phases.

use serde::{Deserialize, Serialize};

use crate::bet::Bet;
use crate::outcome::Outcome;

/// Lifecycle phase of a round. Transitions are monotonic:
/// `Betting -> Spinning -> Settled`, then a fresh round opens in `Betting`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Betting,
    Spinning,
    Settled,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Betting => "betting",
            Phase::Spinning => "spinning",
            Phase::Settled => "settled",
        }
    }
}

/// A single table round. Exactly one round per table is in `Betting` or
/// `Spinning` at any time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub id: u64,
    pub phase: Phase,
    /// Deadline of the betting window, milliseconds on the table clock.
    pub betting_ends_at_ms: u64,
    pub bets: Vec<Bet>,
    /// Set exactly once, on entry to `Spinning`.
    pub outcome: Option<Outcome>,
}

impl Round {
    pub fn open(id: u64, betting_ends_at_ms: u64) -> Self {
        Self {
            id,
            phase: Phase::Betting,
            betting_ends_at_ms,
            bets: Vec::new(),
            outcome: None,
        }
    }
}
