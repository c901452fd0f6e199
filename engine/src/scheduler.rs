//! Round scheduler for the table.
//!
//! Pure phase-transition logic, separated from storage and I/O. A round moves
//! through three phases:
//!
//! 1. **Betting** - wagers are accepted until the deadline
//! 2. **Spinning** - outcome drawn, held for the presentation delay
//! 3. **Settled** - winners credited; a fresh round opens immediately
//!
//! All timing is in milliseconds on the caller-supplied table clock; the
//! scheduler never reads a wall clock. Expiry of the betting deadline is the
//! sole spin trigger; there is no early-spin path.

use spindle_types::Phase;

/// Table configuration: phase durations and bet limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableConfig {
    /// Duration of the betting window in milliseconds.
    pub betting_ms: u64,
    /// Presentation delay between the draw and settlement, so the client
    /// animation has time to run. Not gated on any client acknowledgment.
    pub spin_ms: u64,
    pub min_bet: u64,
    pub max_bet: u64,
    pub max_bets_per_round: u8,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            betting_ms: 20_000,
            spin_ms: 6_000,
            min_bet: 1,
            max_bet: 1_000_000,
            max_bets_per_round: 64,
        }
    }
}

impl TableConfig {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.betting_ms == 0 {
            return Err("betting_ms must be greater than zero");
        }
        if self.spin_ms == 0 {
            return Err("spin_ms must be greater than zero");
        }
        if self.min_bet == 0 {
            return Err("min_bet must be greater than zero");
        }
        if self.max_bet < self.min_bet {
            return Err("max_bet must be at least min_bet");
        }
        if self.max_bets_per_round == 0 {
            return Err("max_bets_per_round must be greater than zero");
        }
        Ok(())
    }
}

/// Result of a phase transition check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionResult {
    /// Remain in the current phase.
    NoTransition,
    /// Move to the given phase; the new phase ends at `phase_ends_at_ms`.
    TransitionTo {
        phase: Phase,
        phase_ends_at_ms: u64,
    },
}

/// Deterministic phase transition logic without any I/O.
#[derive(Clone, Debug)]
pub struct RoundScheduler {
    config: TableConfig,
}

impl RoundScheduler {
    pub fn new(config: TableConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// The phase after the given one. `None` after `Settled`: a new round is
    /// opened explicitly, never by the clock.
    pub fn next_phase(phase: Phase) -> Option<Phase> {
        match phase {
            Phase::Betting => Some(Phase::Spinning),
            Phase::Spinning => Some(Phase::Settled),
            Phase::Settled => None,
        }
    }

    /// Check whether the current phase's deadline has passed and, if so,
    /// where to go next.
    pub fn check_transition(
        &self,
        current_phase: Phase,
        phase_ends_at_ms: u64,
        now_ms: u64,
    ) -> TransitionResult {
        if now_ms < phase_ends_at_ms {
            return TransitionResult::NoTransition;
        }
        let next = match Self::next_phase(current_phase) {
            Some(phase) => phase,
            None => return TransitionResult::NoTransition,
        };
        let duration = match next {
            Phase::Spinning => self.config.spin_ms,
            // Settlement is instantaneous; the next betting window opens on
            // entry.
            Phase::Betting | Phase::Settled => 0,
        };
        TransitionResult::TransitionTo {
            phase: next,
            phase_ends_at_ms: now_ms.saturating_add(duration),
        }
    }

    /// Whether a wager may be accepted right now.
    pub fn is_betting_open(&self, phase: Phase, betting_ends_at_ms: u64, now_ms: u64) -> bool {
        matches!(phase, Phase::Betting) && now_ms < betting_ends_at_ms
    }

    /// Deadline of a betting window opening at `start_ms`.
    pub fn betting_deadline(&self, start_ms: u64) -> u64 {
        start_ms.saturating_add(self.config.betting_ms)
    }

    /// End of the presentation delay for a spin starting at `now_ms`.
    pub fn spin_deadline(&self, now_ms: u64) -> u64 {
        now_ms.saturating_add(self.config.spin_ms)
    }
}
