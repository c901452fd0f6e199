//! Bet shapes and table-layout footprints.
//!
//! The European layout is twelve rows of three numbers (1-3, 4-6, .. 34-36) with
//! the zero sitting above the first row. Inside bets name their numbers
//! explicitly; outside bets (colour, parity, range) carry no numbers because
//! their footprint is a predicate on the outcome.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::outcome::MAX_NUMBER;
use crate::player::PlayerId;

/// The thirteen supported bet shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetKind {
    Straight,
    Split,
    Street,
    Corner,
    Line,
    Dozen,
    Column,
    Red,
    Black,
    Even,
    Odd,
    Low,
    High,
}

impl BetKind {
    /// Every supported bet kind, in wire order.
    pub const ALL: [BetKind; 13] = [
        BetKind::Straight,
        BetKind::Split,
        BetKind::Street,
        BetKind::Corner,
        BetKind::Line,
        BetKind::Dozen,
        BetKind::Column,
        BetKind::Red,
        BetKind::Black,
        BetKind::Even,
        BetKind::Odd,
        BetKind::Low,
        BetKind::High,
    ];

    /// Odds numerator for the kind. A winning bet is credited
    /// `amount * odds()`; the stake itself is never returned.
    pub fn odds(&self) -> u64 {
        match self {
            BetKind::Straight => 35,
            BetKind::Split => 17,
            BetKind::Street => 11,
            BetKind::Corner => 8,
            BetKind::Line => 5,
            BetKind::Dozen | BetKind::Column => 2,
            BetKind::Red
            | BetKind::Black
            | BetKind::Even
            | BetKind::Odd
            | BetKind::Low
            | BetKind::High => 1,
        }
    }

    /// Required `numbers` cardinality for the kind.
    pub fn footprint_len(&self) -> usize {
        match self {
            BetKind::Straight => 1,
            BetKind::Split => 2,
            BetKind::Street => 3,
            BetKind::Corner => 4,
            BetKind::Line => 6,
            BetKind::Dozen | BetKind::Column => 12,
            BetKind::Red
            | BetKind::Black
            | BetKind::Even
            | BetKind::Odd
            | BetKind::Low
            | BetKind::High => 0,
        }
    }

    /// True for bets whose winning predicate is containment of the winning
    /// number in the explicit footprint.
    pub fn is_inside(&self) -> bool {
        matches!(
            self,
            BetKind::Straight | BetKind::Split | BetKind::Street | BetKind::Corner | BetKind::Line
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BetKind::Straight => "straight",
            BetKind::Split => "split",
            BetKind::Street => "street",
            BetKind::Corner => "corner",
            BetKind::Line => "line",
            BetKind::Dozen => "dozen",
            BetKind::Column => "column",
            BetKind::Red => "red",
            BetKind::Black => "black",
            BetKind::Even => "even",
            BetKind::Odd => "odd",
            BetKind::Low => "low",
            BetKind::High => "high",
        }
    }
}

/// Why a submitted footprint is not legal for its bet kind.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FootprintError {
    #[error("{kind} bet requires exactly {expected} numbers, got {got}")]
    WrongCount {
        kind: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("number {0} is not on the table")]
    OutOfRange(u8),
    #[error("numbers are not adjacent on the layout")]
    NotAdjacent,
    #[error("numbers do not form a street")]
    NotAStreet,
    #[error("numbers do not form a corner")]
    NotACorner,
    #[error("numbers do not span two full rows")]
    NotALine,
    #[error("numbers do not form a dozen")]
    NotADozen,
    #[error("numbers do not form a column")]
    NotAColumn,
}

/// Validate a submitted footprint against the fixed table geometry.
///
/// Cardinality is checked first, then every number is range-checked, then the
/// shape itself. Outside bets must carry no numbers at all.
pub fn validate_footprint(kind: BetKind, numbers: &[u8]) -> Result<(), FootprintError> {
    let expected = kind.footprint_len();
    if numbers.len() != expected {
        return Err(FootprintError::WrongCount {
            kind: kind.as_str(),
            expected,
            got: numbers.len(),
        });
    }
    for &n in numbers {
        if n > MAX_NUMBER {
            return Err(FootprintError::OutOfRange(n));
        }
    }

    let mut sorted = numbers.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    if sorted.len() != expected {
        // Duplicates collapse the footprint below its required size.
        return Err(FootprintError::WrongCount {
            kind: kind.as_str(),
            expected,
            got: sorted.len(),
        });
    }

    match kind {
        BetKind::Straight => Ok(()),
        BetKind::Split => validate_split(sorted[0], sorted[1]),
        BetKind::Street => validate_street(&sorted),
        BetKind::Corner => validate_corner(&sorted),
        BetKind::Line => validate_line(&sorted),
        BetKind::Dozen => validate_dozen(&sorted),
        BetKind::Column => validate_column(&sorted),
        // Cardinality zero was already enforced above.
        _ => Ok(()),
    }
}

/// Row index (0-11) of a non-zero number.
fn row(n: u8) -> u8 {
    (n - 1) / 3
}

fn validate_split(a: u8, b: u8) -> Result<(), FootprintError> {
    // The zero pocket borders the whole first row.
    if a == 0 {
        return if (1..=3).contains(&b) {
            Ok(())
        } else {
            Err(FootprintError::NotAdjacent)
        };
    }
    let vertical = b == a + 3;
    let horizontal = b == a + 1 && row(a) == row(b);
    if vertical || horizontal {
        Ok(())
    } else {
        Err(FootprintError::NotAdjacent)
    }
}

fn validate_street(sorted: &[u8]) -> Result<(), FootprintError> {
    let first = sorted[0];
    if first >= 1 && first % 3 == 1 && sorted[1] == first + 1 && sorted[2] == first + 2 {
        Ok(())
    } else {
        Err(FootprintError::NotAStreet)
    }
}

fn validate_corner(sorted: &[u8]) -> Result<(), FootprintError> {
    let n = sorted[0];
    // Anchor must not sit in the rightmost column, and the square must fit.
    let anchored = n >= 1 && n % 3 != 0 && n + 4 <= MAX_NUMBER;
    if anchored && sorted[1] == n + 1 && sorted[2] == n + 3 && sorted[3] == n + 4 {
        Ok(())
    } else {
        Err(FootprintError::NotACorner)
    }
}

fn validate_line(sorted: &[u8]) -> Result<(), FootprintError> {
    let first = sorted[0];
    if first < 1 || first % 3 != 1 || first + 5 > MAX_NUMBER {
        return Err(FootprintError::NotALine);
    }
    for (i, &n) in sorted.iter().enumerate() {
        if n != first + i as u8 {
            return Err(FootprintError::NotALine);
        }
    }
    Ok(())
}

fn validate_dozen(sorted: &[u8]) -> Result<(), FootprintError> {
    let first = sorted[0];
    if first == 0 || (first - 1) % 12 != 0 {
        return Err(FootprintError::NotADozen);
    }
    for (i, &n) in sorted.iter().enumerate() {
        if n != first + i as u8 {
            return Err(FootprintError::NotADozen);
        }
    }
    Ok(())
}

fn validate_column(sorted: &[u8]) -> Result<(), FootprintError> {
    let first = sorted[0];
    if !(1..=3).contains(&first) {
        return Err(FootprintError::NotAColumn);
    }
    for (i, &n) in sorted.iter().enumerate() {
        if n != first + 3 * i as u8 {
            return Err(FootprintError::NotAColumn);
        }
    }
    Ok(())
}

/// Dozen group (1-3) implied by a validated dozen footprint.
pub fn dozen_group(numbers: &[u8]) -> u8 {
    let min = numbers.iter().copied().min().unwrap_or(1);
    (min - 1) / 12 + 1
}

/// Column group (1-3) implied by a validated column footprint.
pub fn column_group(numbers: &[u8]) -> u8 {
    let min = numbers.iter().copied().min().unwrap_or(1);
    (min - 1) % 3 + 1
}

/// A wager admitted into a round. Immutable once created; archived at
/// settlement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bet {
    pub id: u64,
    pub player: PlayerId,
    pub kind: BetKind,
    pub numbers: Vec<u8>,
    pub amount: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dozen_numbers(group: u8) -> Vec<u8> {
        let start = (group - 1) * 12 + 1;
        (start..start + 12).collect()
    }

    fn column_numbers(group: u8) -> Vec<u8> {
        (0..12u8).map(|i| group + 3 * i).collect()
    }

    #[test]
    fn odds_table() {
        assert_eq!(BetKind::Straight.odds(), 35);
        assert_eq!(BetKind::Split.odds(), 17);
        assert_eq!(BetKind::Street.odds(), 11);
        assert_eq!(BetKind::Corner.odds(), 8);
        assert_eq!(BetKind::Line.odds(), 5);
        assert_eq!(BetKind::Dozen.odds(), 2);
        assert_eq!(BetKind::Column.odds(), 2);
        for kind in [
            BetKind::Red,
            BetKind::Black,
            BetKind::Even,
            BetKind::Odd,
            BetKind::Low,
            BetKind::High,
        ] {
            assert_eq!(kind.odds(), 1);
        }
    }

    #[test]
    fn straight_accepts_every_pocket() {
        for n in 0..=36u8 {
            assert_eq!(validate_footprint(BetKind::Straight, &[n]), Ok(()));
        }
        assert_eq!(
            validate_footprint(BetKind::Straight, &[37]),
            Err(FootprintError::OutOfRange(37))
        );
    }

    #[test]
    fn split_accepts_exactly_the_adjacent_pairs() {
        let mut legal = 0;
        for a in 0..=36u8 {
            for b in (a + 1)..=36 {
                let ok = validate_footprint(BetKind::Split, &[a, b]).is_ok();
                let expected = (a == 0 && (1..=3).contains(&b))
                    || (a >= 1 && b == a + 3)
                    || (a >= 1 && b == a + 1 && (a - 1) / 3 == (b - 1) / 3);
                assert_eq!(ok, expected, "pair {a},{b}");
                if ok {
                    legal += 1;
                }
            }
        }
        // 24 horizontal + 33 vertical + 3 zero splits.
        assert_eq!(legal, 60);
    }

    #[test]
    fn split_order_does_not_matter() {
        assert_eq!(validate_footprint(BetKind::Split, &[5, 2]), Ok(()));
        assert_eq!(validate_footprint(BetKind::Split, &[1, 0]), Ok(()));
    }

    #[test]
    fn street_accepts_exactly_the_twelve_rows() {
        let mut legal = 0;
        for a in 0..=34u8 {
            let ok = validate_footprint(BetKind::Street, &[a, a + 1, a + 2]).is_ok();
            assert_eq!(ok, a >= 1 && a % 3 == 1, "street starting at {a}");
            if ok {
                legal += 1;
            }
        }
        assert_eq!(legal, 12);
    }

    #[test]
    fn corner_accepts_exactly_the_twenty_two_squares() {
        let mut legal = 0;
        for n in 0..=32u8 {
            let ok = validate_footprint(BetKind::Corner, &[n, n + 1, n + 3, n + 4]).is_ok();
            assert_eq!(ok, n >= 1 && n % 3 != 0, "corner anchored at {n}");
            if ok {
                legal += 1;
            }
        }
        assert_eq!(legal, 22);
        // Right-edge anchor wraps into the next row; never legal.
        assert!(validate_footprint(BetKind::Corner, &[3, 4, 6, 7]).is_err());
    }

    #[test]
    fn line_accepts_exactly_the_eleven_double_rows() {
        let mut legal = 0;
        for a in 0..=31u8 {
            let numbers: Vec<u8> = (a..a + 6).collect();
            let ok = validate_footprint(BetKind::Line, &numbers).is_ok();
            assert_eq!(ok, a >= 1 && a % 3 == 1, "line starting at {a}");
            if ok {
                legal += 1;
            }
        }
        assert_eq!(legal, 11);
    }

    #[test]
    fn dozen_and_column_footprints() {
        for group in 1..=3u8 {
            assert_eq!(
                validate_footprint(BetKind::Dozen, &dozen_numbers(group)),
                Ok(())
            );
            assert_eq!(dozen_group(&dozen_numbers(group)), group);
            assert_eq!(
                validate_footprint(BetKind::Column, &column_numbers(group)),
                Ok(())
            );
            assert_eq!(column_group(&column_numbers(group)), group);
        }
        // A dozen is not a column and vice versa.
        assert!(validate_footprint(BetKind::Column, &dozen_numbers(1)).is_err());
        assert!(validate_footprint(BetKind::Dozen, &column_numbers(1)).is_err());
        // Shifted ranges are rejected.
        let shifted: Vec<u8> = (2..14).collect();
        assert!(validate_footprint(BetKind::Dozen, &shifted).is_err());
    }

    #[test]
    fn outside_bets_reject_numbers() {
        assert_eq!(validate_footprint(BetKind::Red, &[]), Ok(()));
        assert_eq!(
            validate_footprint(BetKind::Red, &[1]),
            Err(FootprintError::WrongCount {
                kind: "red",
                expected: 0,
                got: 1
            })
        );
    }

    #[test]
    fn duplicates_are_rejected() {
        assert_eq!(
            validate_footprint(BetKind::Split, &[4, 4]),
            Err(FootprintError::WrongCount {
                kind: "split",
                expected: 2,
                got: 1
            })
        );
    }

    #[test]
    fn kind_serde_uses_lowercase_names() {
        for kind in BetKind::ALL {
            let encoded = serde_json::to_string(&kind).unwrap();
            assert_eq!(encoded, format!("\"{}\"", kind.as_str()));
            let decoded: BetKind = serde_json::from_str(&encoded).unwrap();
            assert_eq!(decoded, kind);
        }
    }
}
