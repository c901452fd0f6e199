//! Spindle data model.
//!
//! Pure types shared by the engine and the live-table service: bet shapes and their
//! layout footprints, wheel outcomes, rounds, player accounts, and settlement
//! results. No I/O and no clocks live here.

pub mod bet;
pub mod outcome;
pub mod player;
pub mod round;
pub mod settlement;

pub use bet::{column_group, dozen_group, validate_footprint, Bet, BetKind, FootprintError};
pub use outcome::{is_red, Color, Outcome, MAX_NUMBER, RED_NUMBERS, WHEEL_SIZE};
pub use player::{Account, PlayerId};
pub use round::{Phase, Round};
pub use settlement::{BetResolution, PlayerSettlement, SettlementResult};
