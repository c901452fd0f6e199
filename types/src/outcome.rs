//! Wheel outcomes and their classification attributes.

use serde::{Deserialize, Serialize};

/// Pockets on a European wheel (0-36).
pub const WHEEL_SIZE: u8 = 37;

/// Highest pocket number.
pub const MAX_NUMBER: u8 = 36;

/// Red pockets on a European wheel.
pub const RED_NUMBERS: [u8; 18] = [
    1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36,
];

/// Check if a pocket is red. Zero is green, everything else non-red is black.
pub fn is_red(number: u8) -> bool {
    RED_NUMBERS.contains(&number)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Black,
    Green,
}

/// A single authoritative wheel result.
///
/// All attributes are derived from `winning_number`: zero is green and belongs
/// to no parity, range, dozen, or column (those fields read 0 / false).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub winning_number: u8,
    pub color: Color,
    pub is_even: bool,
    pub is_low: bool,
    /// 1-3, or 0 for zero.
    pub dozen: u8,
    /// 1-3, or 0 for zero.
    pub column: u8,
}

impl Outcome {
    /// Derive the outcome for a pocket. Returns `None` if the number is not on
    /// the wheel.
    pub fn of(winning_number: u8) -> Option<Self> {
        if winning_number > MAX_NUMBER {
            return None;
        }
        let color = if winning_number == 0 {
            Color::Green
        } else if is_red(winning_number) {
            Color::Red
        } else {
            Color::Black
        };
        Some(Self {
            winning_number,
            color,
            is_even: winning_number != 0 && winning_number % 2 == 0,
            is_low: (1..=18).contains(&winning_number),
            dozen: if winning_number == 0 {
                0
            } else {
                (winning_number - 1) / 12 + 1
            },
            column: if winning_number == 0 {
                0
            } else {
                (winning_number - 1) % 3 + 1
            },
        })
    }
}
