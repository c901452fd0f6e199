//! Engine error taxonomy.

use spindle_types::FootprintError;
use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by the table. Validation and balance errors are terminal
/// for the individual request only; they never affect other players' bets in
/// the same round.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("betting is closed for the current round")]
    BettingClosed,
    #[error("invalid bet: {0}")]
    InvalidBet(#[from] FootprintError),
    #[error("bet amount {got} outside table limits {min}..={max}")]
    AmountOutOfRange { got: u64, min: u64, max: u64 },
    #[error("player already holds the maximum of {max} bets this round")]
    TooManyBets { max: u8 },
    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: u64, available: u64 },
    #[error("player is not seated at the table")]
    UnknownPlayer,
    #[error("round {0} has no outcome to settle against")]
    MissingOutcome(u64),
    #[error("invalid table configuration: {0}")]
    InvalidConfig(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TableError {
    /// Stable machine-readable code for the wire protocol.
    pub fn code(&self) -> &'static str {
        match self {
            TableError::BettingClosed => "BETTING_CLOSED",
            TableError::InvalidBet(_)
            | TableError::AmountOutOfRange { .. }
            | TableError::TooManyBets { .. } => "INVALID_BET",
            TableError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            TableError::UnknownPlayer => "NOT_SUBSCRIBED",
            TableError::MissingOutcome(_) | TableError::InvalidConfig(_) => "INTERNAL",
            TableError::Store(_) => "STORE_FAILURE",
        }
    }
}
