//! The table aggregate.
//!
//! A [`Table`] owns one round at a time and drives it through the betting
//! window, the spin, and settlement. All balance mutations flow through here:
//! stakes are debited at acceptance (atomically with admission, via the
//! store) and winnings credited at settlement. Callers supply time as
//! `now_ms` on the table clock; the table itself never reads a wall clock.

use std::collections::{HashMap, VecDeque};

use serde::Serialize;
use spindle_types::{
    Account, Bet, BetKind, Outcome, Phase, PlayerId, Round, SettlementResult,
};
use tracing::{info, warn};

use crate::error::TableError;
use crate::scheduler::{RoundScheduler, TableConfig, TransitionResult};
use crate::settlement::settle;
use crate::store::TableStore;
use crate::validator::validate_bet;
use crate::wheel::Wheel;

/// Balance granted to a player seen for the first time.
pub const STARTING_BALANCE: u64 = 1_000;

/// Outcomes retained for the history feed, most recent first.
pub const HISTORY_LIMIT: usize = 50;

/// Pockets listed in each of the snapshot's hot and cold lists.
const STATS_LIMIT: usize = 5;

/// State changes produced by a tick, in the order they happened.
#[derive(Clone, Debug, PartialEq)]
pub enum TableEvent {
    PhaseChanged {
        round_id: u64,
        phase: Phase,
        phase_ends_at_ms: u64,
    },
    Spun {
        round_id: u64,
        outcome: Outcome,
    },
    Settled {
        result: SettlementResult,
    },
}

/// Acknowledgment of an accepted bet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BetReceipt {
    pub bet_id: u64,
    pub round_id: u64,
    /// Post-debit balance.
    pub new_balance: u64,
    /// Winnings this bet would credit on a win.
    pub potential_payout: u64,
}

/// Staked total for one bet kind in the current round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BetTotal {
    pub kind: BetKind,
    pub amount: u64,
}

/// Read-only view of the table for clients.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSnapshot {
    pub round_id: u64,
    pub phase: Phase,
    pub time_remaining_ms: u64,
    pub outcome: Option<Outcome>,
    /// Result of the most recently settled round.
    pub last_result: Option<SettlementResult>,
    pub table_totals: Vec<BetTotal>,
    /// Winning numbers of recent rounds, most recent first.
    pub recent_spins: Vec<u8>,
    pub hot_numbers: Vec<u8>,
    pub cold_numbers: Vec<u8>,
    pub player_count: usize,
}

pub struct Table<S: TableStore, W: Wheel> {
    scheduler: RoundScheduler,
    wheel: W,
    store: S,
    round: Round,
    phase_ends_at_ms: u64,
    /// Players currently seated. Accounts mirror the store's balances for
    /// players we have admitted this session.
    accounts: HashMap<PlayerId, Account>,
    /// Settlements by round id. Consulted before computing, so settling a
    /// round is idempotent.
    settlements: HashMap<u64, SettlementResult>,
    last_settled: Option<u64>,
    history: VecDeque<Outcome>,
    next_bet_id: u64,
    lifetime_wagered: u64,
    lifetime_won: u64,
}

impl<S: TableStore, W: Wheel> Table<S, W> {
    /// Open a table, resuming any round the store still holds.
    pub fn new(config: TableConfig, wheel: W, store: S, now_ms: u64) -> Result<Self, TableError> {
        config.validate().map_err(TableError::InvalidConfig)?;
        let mut table = Self {
            scheduler: RoundScheduler::new(config),
            wheel,
            store,
            round: Round::open(0, 0),
            phase_ends_at_ms: 0,
            accounts: HashMap::new(),
            settlements: HashMap::new(),
            last_settled: None,
            history: VecDeque::new(),
            next_bet_id: 1,
            lifetime_wagered: 0,
            lifetime_won: 0,
        };
        table.recover(now_ms)?;
        Ok(table)
    }

    pub fn config(&self) -> &TableConfig {
        self.scheduler.config()
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn account(&self, player: &str) -> Option<&Account> {
        self.accounts.get(player)
    }

    /// Lifetime (wagered, won) across all settled rounds this session.
    pub fn totals(&self) -> (u64, u64) {
        (self.lifetime_wagered, self.lifetime_won)
    }

    /// Seat a player. First-time players are granted [`STARTING_BALANCE`];
    /// returning players resume their stored balance.
    pub fn join(&mut self, player: &str) -> Result<Account, TableError> {
        if let Some(account) = self.accounts.get(player) {
            return Ok(account.clone());
        }
        let balance = match self.store.load_balance(player)? {
            Some(balance) => balance,
            None => {
                info!(player, balance = STARTING_BALANCE, "granting starting balance");
                self.store.apply_balance_delta(player, STARTING_BALANCE as i64)?
            }
        };
        let account = Account::with_balance(balance);
        self.accounts.insert(player.to_string(), account.clone());
        Ok(account)
    }

    /// Unseat a player. Their balance stays in the store; bets already
    /// admitted this round remain live and settle normally.
    pub fn leave(&mut self, player: &str) {
        self.accounts.remove(player);
    }

    /// Validate and admit a wager into the current round.
    ///
    /// The stake debit and the bet admission are one store transaction; on
    /// any error nothing has changed.
    pub fn place_bet(
        &mut self,
        player: &str,
        kind: BetKind,
        numbers: &[u8],
        amount: u64,
        now_ms: u64,
    ) -> Result<BetReceipt, TableError> {
        let account = self.accounts.get(player).ok_or(TableError::UnknownPlayer)?;
        let held = self.round.bets.iter().filter(|b| b.player == player).count();
        validate_bet(
            self.scheduler.config(),
            self.round.phase,
            self.round.betting_ends_at_ms,
            now_ms,
            kind,
            numbers,
            amount,
            account.balance,
            held,
        )?;

        let bet = Bet {
            id: self.next_bet_id,
            player: player.to_string(),
            kind,
            numbers: numbers.to_vec(),
            amount,
        };
        let new_balance = self.store.persist_bet(self.round.id, &bet)?;
        self.next_bet_id += 1;
        self.round.bets.push(bet.clone());

        let account = self
            .accounts
            .get_mut(player)
            .ok_or(TableError::UnknownPlayer)?;
        account.balance = new_balance;
        account.total_wagered += amount;
        account.bet_count += 1;

        info!(
            player,
            round_id = self.round.id,
            bet_id = bet.id,
            kind = kind.as_str(),
            amount,
            new_balance,
            "bet accepted"
        );
        Ok(BetReceipt {
            bet_id: bet.id,
            round_id: self.round.id,
            new_balance,
            potential_payout: amount * kind.odds(),
        })
    }

    /// Advance the clock. Applies every transition that is due and returns
    /// the resulting events in order. Safe to call as often as the caller
    /// likes; a tick with nothing due returns no events.
    pub fn tick(&mut self, now_ms: u64) -> Result<Vec<TableEvent>, TableError> {
        let mut events = Vec::new();
        loop {
            match self
                .scheduler
                .check_transition(self.round.phase, self.phase_ends_at_ms, now_ms)
            {
                TransitionResult::NoTransition => break,
                TransitionResult::TransitionTo {
                    phase: Phase::Spinning,
                    phase_ends_at_ms,
                } => self.begin_spin(phase_ends_at_ms, &mut events)?,
                TransitionResult::TransitionTo {
                    phase: Phase::Settled,
                    ..
                } => self.finalize_round(now_ms, &mut events)?,
                TransitionResult::TransitionTo {
                    phase: Phase::Betting,
                    ..
                } => break,
            }
        }
        Ok(events)
    }

    /// Client view of the table right now.
    pub fn snapshot(&self, now_ms: u64) -> RoundSnapshot {
        RoundSnapshot {
            round_id: self.round.id,
            phase: self.round.phase,
            time_remaining_ms: self.phase_ends_at_ms.saturating_sub(now_ms),
            outcome: self.round.outcome,
            last_result: self
                .last_settled
                .and_then(|id| self.settlements.get(&id).cloned()),
            table_totals: self.table_totals(),
            recent_spins: self.history.iter().map(|o| o.winning_number).collect(),
            hot_numbers: self.hot_numbers(STATS_LIMIT),
            cold_numbers: self.cold_numbers(STATS_LIMIT),
            player_count: self.accounts.len(),
        }
    }

    /// Aggregate staked amount per bet kind in the current round, in wire
    /// order, kinds with no stake omitted.
    pub fn table_totals(&self) -> Vec<BetTotal> {
        BetKind::ALL
            .iter()
            .filter_map(|&kind| {
                let amount: u64 = self
                    .round
                    .bets
                    .iter()
                    .filter(|b| b.kind == kind)
                    .map(|b| b.amount)
                    .sum();
                (amount > 0).then_some(BetTotal { kind, amount })
            })
            .collect()
    }

    /// Settlement of a past round, if one was recorded.
    pub fn settlement_for(&self, round_id: u64) -> Result<Option<SettlementResult>, TableError> {
        if let Some(result) = self.settlements.get(&round_id) {
            return Ok(Some(result.clone()));
        }
        Ok(self.store.load_settlement(round_id)?)
    }

    /// Most frequent recent numbers, ties broken by pocket order. Only
    /// numbers that actually appeared qualify.
    pub fn hot_numbers(&self, limit: usize) -> Vec<u8> {
        let counts = self.history_counts();
        let mut seen: Vec<(u8, u32)> = counts
            .iter()
            .enumerate()
            .filter(|(_, &c)| c > 0)
            .map(|(n, &c)| (n as u8, c))
            .collect();
        seen.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        seen.into_iter().take(limit).map(|(n, _)| n).collect()
    }

    /// Least frequent recent numbers, ties broken by pocket order. Pockets
    /// that never appeared rank coldest; the hot set of the same size is
    /// excluded, so the two lists never overlap.
    pub fn cold_numbers(&self, limit: usize) -> Vec<u8> {
        let hot = self.hot_numbers(limit);
        let counts = self.history_counts();
        let mut all: Vec<(u8, u32)> = counts
            .iter()
            .enumerate()
            .map(|(n, &c)| (n as u8, c))
            .filter(|(n, _)| !hot.contains(n))
            .collect();
        all.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        all.into_iter().take(limit).map(|(n, _)| n).collect()
    }

    fn history_counts(&self) -> [u32; 37] {
        let mut counts = [0u32; 37];
        for outcome in &self.history {
            counts[outcome.winning_number as usize] += 1;
        }
        counts
    }

    fn recover(&mut self, now_ms: u64) -> Result<(), TableError> {
        let stored = self.store.load_active_round()?;
        let round = match stored {
            None => {
                self.open_round(1, now_ms, &mut Vec::new())?;
                return Ok(());
            }
            Some(round) => round,
        };
        self.next_bet_id = round.bets.iter().map(|b| b.id).max().unwrap_or(0) + 1;
        match round.phase {
            Phase::Betting => {
                info!(round_id = round.id, "resuming betting window");
                self.phase_ends_at_ms = round.betting_ends_at_ms;
                self.round = round;
            }
            Phase::Spinning => {
                if round.outcome.is_none() {
                    return Err(TableError::MissingOutcome(round.id));
                }
                info!(round_id = round.id, "resuming spin, re-arming the delay");
                self.phase_ends_at_ms = self.scheduler.spin_deadline(now_ms);
                self.round = round;
            }
            Phase::Settled => {
                let next_id = round.id + 1;
                self.round = round;
                let mut events = Vec::new();
                self.settle_once(&mut events)?;
                self.open_round(next_id, now_ms, &mut events)?;
            }
        }
        Ok(())
    }

    fn begin_spin(&mut self, phase_ends_at_ms: u64, events: &mut Vec<TableEvent>) -> Result<(), TableError> {
        // The single draw for this round.
        let outcome = self.wheel.spin();
        self.round.phase = Phase::Spinning;
        self.round.outcome = Some(outcome);
        self.phase_ends_at_ms = phase_ends_at_ms;
        self.store.persist_round(&self.round)?;
        info!(
            round_id = self.round.id,
            winning_number = outcome.winning_number,
            bets = self.round.bets.len(),
            "wheel spun"
        );
        events.push(TableEvent::PhaseChanged {
            round_id: self.round.id,
            phase: Phase::Spinning,
            phase_ends_at_ms,
        });
        events.push(TableEvent::Spun {
            round_id: self.round.id,
            outcome,
        });
        Ok(())
    }

    /// Settle the current round and immediately open the next one.
    fn finalize_round(&mut self, now_ms: u64, events: &mut Vec<TableEvent>) -> Result<(), TableError> {
        self.round.phase = Phase::Settled;
        self.store.persist_round(&self.round)?;
        let next_id = self.round.id + 1;
        self.settle_once(events)?;
        self.open_round(next_id, now_ms, events)
    }

    /// Compute and commit the round's settlement, unless one is already
    /// recorded, in which case the recorded result is adopted as-is (its
    /// credits are committed with it).
    fn settle_once(&mut self, events: &mut Vec<TableEvent>) -> Result<(), TableError> {
        let round_id = self.round.id;
        let outcome = self
            .round
            .outcome
            .ok_or(TableError::MissingOutcome(round_id))?;

        let result = match self.settlement_for(round_id)? {
            Some(result) => {
                warn!(round_id, "settlement already recorded, adopting it");
                result
            }
            None => {
                let mut balances = HashMap::new();
                for bet in &self.round.bets {
                    if !balances.contains_key(&bet.player) {
                        let balance = self.store.load_balance(&bet.player)?.unwrap_or(0);
                        balances.insert(bet.player.clone(), balance);
                    }
                }
                let result = settle(round_id, &self.round.bets, outcome, &balances);
                // One store transaction: the record and the winner credits
                // land together, so recovery can trust either state.
                self.store.persist_settlement(&result)?;
                result
            }
        };

        for settled in &result.per_player {
            if let Some(account) = self.accounts.get_mut(&settled.player) {
                account.balance = settled.new_balance;
                account.total_won += settled.total_won;
            }
        }
        self.lifetime_wagered += result.total_wagered;
        self.lifetime_won += result.total_won;

        self.history.push_front(outcome);
        self.history.truncate(HISTORY_LIMIT);
        self.settlements.insert(round_id, result.clone());
        self.last_settled = Some(round_id);

        info!(
            round_id,
            winning_number = outcome.winning_number,
            total_wagered = result.total_wagered,
            total_won = result.total_won,
            "round settled"
        );
        events.push(TableEvent::Settled { result });
        Ok(())
    }

    fn open_round(&mut self, id: u64, now_ms: u64, events: &mut Vec<TableEvent>) -> Result<(), TableError> {
        let betting_ends_at_ms = self.scheduler.betting_deadline(now_ms);
        self.round = Round::open(id, betting_ends_at_ms);
        self.phase_ends_at_ms = betting_ends_at_ms;
        self.store.persist_round(&self.round)?;
        info!(round_id = id, betting_ends_at_ms, "betting open");
        events.push(TableEvent::PhaseChanged {
            round_id: id,
            phase: Phase::Betting,
            phase_ends_at_ms: betting_ends_at_ms,
        });
        Ok(())
    }
}

#[cfg(any(test, feature = "mocks"))]
impl<S: TableStore + Clone, W: Wheel> Table<S, W> {
    /// Clone of the backing store, for restart tests.
    pub fn store_snapshot(&self) -> S {
        self.store.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::FixedWheel;
    use crate::store::MemoryStore;

    fn table(numbers: &[u8]) -> Table<MemoryStore, FixedWheel> {
        Table::new(
            TableConfig {
                betting_ms: 20_000,
                spin_ms: 6_000,
                min_bet: 1,
                max_bet: 1_000,
                max_bets_per_round: 8,
            },
            FixedWheel::new(numbers),
            MemoryStore::new(),
            0,
        )
        .unwrap()
    }

    #[test]
    fn rejects_an_invalid_config() {
        let result = Table::new(
            TableConfig { betting_ms: 0, ..TableConfig::default() },
            FixedWheel::new(&[0]),
            MemoryStore::new(),
            0,
        );
        assert!(matches!(result, Err(TableError::InvalidConfig(_))));
    }

    #[test]
    fn first_join_grants_the_starting_balance() {
        let mut table = table(&[7]);
        let account = table.join("alice").unwrap();
        assert_eq!(account.balance, STARTING_BALANCE);
        // Joining again is a no-op.
        assert_eq!(table.join("alice").unwrap().balance, STARTING_BALANCE);
    }

    #[test]
    fn rejoin_resumes_the_stored_balance() {
        let mut table = table(&[7]);
        table.join("alice").unwrap();
        table
            .place_bet("alice", BetKind::Red, &[], 100, 1_000)
            .unwrap();
        table.leave("alice");
        assert_eq!(table.join("alice").unwrap().balance, 900);
    }

    #[test]
    fn bets_require_a_seat() {
        let mut table = table(&[7]);
        let err = table
            .place_bet("ghost", BetKind::Red, &[], 10, 1_000)
            .unwrap_err();
        assert_eq!(err, TableError::UnknownPlayer);
    }

    #[test]
    fn stake_is_debited_at_acceptance() {
        let mut table = table(&[7]);
        table.join("alice").unwrap();
        let receipt = table
            .place_bet("alice", BetKind::Straight, &[7], 10, 1_000)
            .unwrap();
        assert_eq!(receipt.new_balance, 990);
        assert_eq!(receipt.potential_payout, 350);
        assert_eq!(table.account("alice").unwrap().balance, 990);
    }

    #[test]
    fn full_round_lifecycle() {
        let mut table = table(&[7]);
        table.join("alice").unwrap();
        table
            .place_bet("alice", BetKind::Straight, &[7], 10, 1_000)
            .unwrap();
        table.place_bet("alice", BetKind::Red, &[], 5, 1_100).unwrap();

        // Betting deadline: the wheel spins once.
        let events = table.tick(20_000).unwrap();
        assert!(matches!(events[0], TableEvent::PhaseChanged { phase: Phase::Spinning, .. }));
        assert!(matches!(
            events[1],
            TableEvent::Spun { outcome, .. } if outcome.winning_number == 7
        ));

        // Presentation delay elapses: settle and reopen.
        let events = table.tick(26_000).unwrap();
        let result = events
            .iter()
            .find_map(|e| match e {
                TableEvent::Settled { result } => Some(result),
                _ => None,
            })
            .unwrap();
        assert_eq!(result.for_player("alice").unwrap().new_balance, 1_340);
        assert_eq!(table.account("alice").unwrap().balance, 1_340);
        assert!(matches!(
            events.last().unwrap(),
            TableEvent::PhaseChanged { round_id: 2, phase: Phase::Betting, .. }
        ));
        assert_eq!(table.round().id, 2);
        assert_eq!(table.round().phase, Phase::Betting);
    }

    #[test]
    fn ticks_between_deadlines_do_nothing() {
        let mut table = table(&[7]);
        assert!(table.tick(1).unwrap().is_empty());
        assert!(table.tick(19_999).unwrap().is_empty());
    }

    #[test]
    fn snapshot_reflects_phase_and_countdown() {
        let mut table = table(&[7]);
        let snap = table.snapshot(5_000);
        assert_eq!(snap.round_id, 1);
        assert_eq!(snap.phase, Phase::Betting);
        assert_eq!(snap.time_remaining_ms, 15_000);
        assert!(snap.outcome.is_none());

        table.tick(20_000).unwrap();
        let snap = table.snapshot(21_000);
        assert_eq!(snap.phase, Phase::Spinning);
        assert_eq!(snap.time_remaining_ms, 5_000);
        assert_eq!(snap.outcome.unwrap().winning_number, 7);

        table.tick(26_000).unwrap();
        let snap = table.snapshot(26_000);
        assert_eq!(snap.round_id, 2);
        assert_eq!(snap.last_result.as_ref().unwrap().round_id, 1);
        assert_eq!(snap.recent_spins, vec![7]);
    }

    #[test]
    fn snapshot_totals_group_stakes_by_kind() {
        let mut table = table(&[7]);
        table.join("alice").unwrap();
        table.join("bob").unwrap();
        table.place_bet("alice", BetKind::Red, &[], 10, 0).unwrap();
        table.place_bet("bob", BetKind::Red, &[], 15, 0).unwrap();
        table.place_bet("bob", BetKind::Straight, &[7], 3, 0).unwrap();
        let snap = table.snapshot(0);
        assert_eq!(
            snap.table_totals,
            vec![
                BetTotal { kind: BetKind::Straight, amount: 3 },
                BetTotal { kind: BetKind::Red, amount: 25 },
            ]
        );
        assert_eq!(snap.player_count, 2);
    }

    #[test]
    fn history_is_capped_and_most_recent_first() {
        let numbers: Vec<u8> = (0..60).map(|i| (i % 37) as u8).collect();
        let mut table = table(&numbers);
        let mut now = 0u64;
        for _ in 0..60 {
            now += 20_000;
            table.tick(now).unwrap();
            now += 6_000;
            table.tick(now).unwrap();
        }
        let snap = table.snapshot(now);
        assert_eq!(snap.recent_spins.len(), HISTORY_LIMIT);
        // Round 60 drew 59 % 37 = 22.
        assert_eq!(snap.recent_spins[0], 22);
    }

    #[test]
    fn hot_and_cold_track_the_history() {
        let mut table = table(&[7, 7, 7, 19, 19, 0]);
        let mut now = 0u64;
        for _ in 0..6 {
            now += 20_000;
            table.tick(now).unwrap();
            now += 6_000;
            table.tick(now).unwrap();
        }
        assert_eq!(table.hot_numbers(3), vec![7, 19, 0]);
        // Never-seen pockets rank coldest, in pocket order.
        assert_eq!(table.cold_numbers(3), vec![1, 2, 3]);
        let snap = table.snapshot(now);
        assert!(snap.hot_numbers.iter().all(|n| !snap.cold_numbers.contains(n)));
    }

    #[test]
    fn lifetime_totals_accumulate() {
        let mut table = table(&[7, 0]);
        table.join("alice").unwrap();
        table.place_bet("alice", BetKind::Red, &[], 10, 0).unwrap();
        table.tick(20_000).unwrap();
        table.tick(26_000).unwrap();
        table.place_bet("alice", BetKind::Red, &[], 10, 26_001).unwrap();
        table.tick(46_000).unwrap();
        table.tick(52_000).unwrap();
        assert_eq!(table.totals(), (20, 10));
    }
}
