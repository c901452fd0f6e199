//! Persistence collaborator interface.
//!
//! The engine assumes the store is durable and strongly consistent per player
//! row. [`MemoryStore`] is the in-process implementation used by the service
//! and the tests; a database-backed implementation slots in behind the same
//! trait.

use std::collections::HashMap;

use spindle_types::{Bet, PlayerId, Round, SettlementResult};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("persistence rejected the write: {0}")]
    WriteFailed(String),
    #[error("balance for {player} cannot cover {needed}")]
    InsufficientFunds { player: PlayerId, needed: u64 },
    #[error("no active round to attach the bet to")]
    NoActiveRound,
}

/// Durable table state. Bet admission is a single transaction: the stake is
/// debited and the bet recorded together, or neither happens.
pub trait TableStore {
    /// The round currently in flight, if any.
    fn load_active_round(&self) -> Result<Option<Round>, StoreError>;

    /// Replace the active round record (new round, phase change, outcome).
    fn persist_round(&mut self, round: &Round) -> Result<(), StoreError>;

    /// Atomically debit `bet.amount` from `bet.player` and append the bet to
    /// the round's bet set. Returns the post-debit balance. Fails without any
    /// change if the balance cannot cover the stake.
    fn persist_bet(&mut self, round_id: u64, bet: &Bet) -> Result<u64, StoreError>;

    /// Record a round's settlement and credit each player's winnings, as one
    /// transaction: the record and the credits land together or not at all,
    /// so a stored record always implies its credits are committed. Recording
    /// an already-recorded round is a no-op. Replayed recoveries consult this
    /// before recomputing.
    fn persist_settlement(&mut self, result: &SettlementResult) -> Result<(), StoreError>;

    /// Settlement previously recorded for a round, if any.
    fn load_settlement(&self, round_id: u64) -> Result<Option<SettlementResult>, StoreError>;

    /// Current balance for a player, `None` if the player is unknown.
    fn load_balance(&self, player: &str) -> Result<Option<u64>, StoreError>;

    /// Apply a signed delta to a player's balance and return the new value.
    /// A delta that would take the balance negative fails without change.
    fn apply_balance_delta(&mut self, player: &str, delta: i64) -> Result<u64, StoreError>;
}

/// In-memory store. Strongly consistent by construction.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    active_round: Option<Round>,
    settlements: HashMap<u64, SettlementResult>,
    balances: HashMap<PlayerId, u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a balance, for tests and bootstrapping.
    pub fn seed_balance(&mut self, player: &str, balance: u64) {
        self.balances.insert(player.to_string(), balance);
    }
}

impl TableStore for MemoryStore {
    fn load_active_round(&self) -> Result<Option<Round>, StoreError> {
        Ok(self.active_round.clone())
    }

    fn persist_round(&mut self, round: &Round) -> Result<(), StoreError> {
        self.active_round = Some(round.clone());
        Ok(())
    }

    fn persist_bet(&mut self, round_id: u64, bet: &Bet) -> Result<u64, StoreError> {
        let balance = self.balances.get(&bet.player).copied().unwrap_or(0);
        let new_balance = balance
            .checked_sub(bet.amount)
            .ok_or_else(|| StoreError::InsufficientFunds {
                player: bet.player.clone(),
                needed: bet.amount,
            })?;
        let round = match self.active_round.as_mut() {
            Some(round) if round.id == round_id => round,
            _ => return Err(StoreError::NoActiveRound),
        };
        round.bets.push(bet.clone());
        self.balances.insert(bet.player.clone(), new_balance);
        Ok(new_balance)
    }

    fn persist_settlement(&mut self, result: &SettlementResult) -> Result<(), StoreError> {
        if self.settlements.contains_key(&result.round_id) {
            return Ok(());
        }
        for settled in &result.per_player {
            if settled.total_won > 0 {
                let balance = self.balances.entry(settled.player.clone()).or_insert(0);
                *balance = balance.saturating_add(settled.total_won);
            }
        }
        self.settlements.insert(result.round_id, result.clone());
        Ok(())
    }

    fn load_settlement(&self, round_id: u64) -> Result<Option<SettlementResult>, StoreError> {
        Ok(self.settlements.get(&round_id).cloned())
    }

    fn load_balance(&self, player: &str) -> Result<Option<u64>, StoreError> {
        Ok(self.balances.get(player).copied())
    }

    fn apply_balance_delta(&mut self, player: &str, delta: i64) -> Result<u64, StoreError> {
        let balance = self.balances.get(player).copied().unwrap_or(0);
        let new_balance = if delta >= 0 {
            balance.saturating_add(delta as u64)
        } else {
            balance
                .checked_sub(delta.unsigned_abs())
                .ok_or_else(|| StoreError::InsufficientFunds {
                    player: player.to_string(),
                    needed: delta.unsigned_abs(),
                })?
        };
        self.balances.insert(player.to_string(), new_balance);
        Ok(new_balance)
    }
}
