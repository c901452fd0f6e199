//! Wager validation.
//!
//! Pure gate in front of the table: phase, amount limits, per-player bet cap,
//! footprint legality, then balance. Order matters for the error a player
//! sees; none of the checks mutate anything. The table performs the atomic
//! debit-and-admit only after this passes.

use spindle_types::{validate_footprint, BetKind, Phase};

use crate::error::TableError;
use crate::scheduler::TableConfig;

#[allow(clippy::too_many_arguments)]
pub fn validate_bet(
    config: &TableConfig,
    phase: Phase,
    betting_ends_at_ms: u64,
    now_ms: u64,
    kind: BetKind,
    numbers: &[u8],
    amount: u64,
    balance: u64,
    bets_already_held: usize,
) -> Result<(), TableError> {
    if phase != Phase::Betting || now_ms >= betting_ends_at_ms {
        return Err(TableError::BettingClosed);
    }
    if amount < config.min_bet || amount > config.max_bet {
        return Err(TableError::AmountOutOfRange {
            got: amount,
            min: config.min_bet,
            max: config.max_bet,
        });
    }
    if bets_already_held >= config.max_bets_per_round as usize {
        return Err(TableError::TooManyBets {
            max: config.max_bets_per_round,
        });
    }
    validate_footprint(kind, numbers)?;
    if balance < amount {
        return Err(TableError::InsufficientBalance {
            needed: amount,
            available: balance,
        });
    }
    Ok(())
}
