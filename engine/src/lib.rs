//! Spindle round lifecycle and settlement engine.
//!
//! This crate owns the authoritative table state: the betting-window state
//! machine, wager validation, outcome generation, per-bet settlement, and the
//! reconciliation contract for optimistic clients.
//!
//! ## Determinism requirements
//! - No wall-clock reads inside the engine; callers supply `now_ms` on the
//!   table clock.
//! - Randomness enters only through the [`Wheel`] given to the table, exactly
//!   once per round at the Betting -> Spinning transition.
//! - Settlement for a round id is computed at most once; replays are served
//!   from the cache and converge to the same result.
//!
//! ## Ownership
//! All balance mutations and phase transitions go through [`Table`]; the
//! client never has write authority over its own balance.

pub mod error;
pub mod reconcile;
pub mod scheduler;
pub mod settlement;
pub mod store;
pub mod table;
pub mod validator;
pub mod wheel;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;


pub use error::TableError;
pub use reconcile::{reconcile, DisplayState};
pub use scheduler::{RoundScheduler, TableConfig, TransitionResult};
pub use settlement::{bet_wins, settle};
pub use store::{MemoryStore, StoreError, TableStore};
pub use table::{
    BetReceipt, BetTotal, RoundSnapshot, Table, TableEvent, HISTORY_LIMIT, STARTING_BALANCE,
};
pub use validator::validate_bet;
pub use wheel::{OutcomeGenerator, Wheel};
