//! Authoritative outcome generation.
//!
//! One wheel per table; one draw per round, taken at the Betting -> Spinning
//! transition. Every consumer of a round's result (client preview, settlement,
//! history) reads the stored outcome; a second draw for the same round is a
//! programming error, not a retry path.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use spindle_types::{Outcome, WHEEL_SIZE};

/// Source of wheel outcomes. The table is generic over this so tests can pin
/// the draw sequence.
pub trait Wheel {
    fn spin(&mut self) -> Outcome;
}

/// Production wheel: uniform draws over 0..=36 from a ChaCha stream.
#[derive(Clone, Debug)]
pub struct OutcomeGenerator {
    rng: ChaCha8Rng,
}

impl OutcomeGenerator {
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Deterministic wheel for tests and replay.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Wheel for OutcomeGenerator {
    fn spin(&mut self) -> Outcome {
        let number = self.rng.gen_range(0..WHEEL_SIZE);
        // gen_range keeps the draw on the wheel.
        Outcome::of(number).expect("draw within wheel range")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = OutcomeGenerator::from_seed(42);
        let mut b = OutcomeGenerator::from_seed(42);
        for _ in 0..100 {
            assert_eq!(a.spin(), b.spin());
        }
    }

    #[test]
    fn draws_stay_on_the_wheel() {
        let mut wheel = OutcomeGenerator::from_seed(3);
        for _ in 0..1_000 {
            let outcome = wheel.spin();
            assert!(outcome.winning_number <= 36);
            assert_eq!(outcome, Outcome::of(outcome.winning_number).unwrap());
        }
    }

    #[test]
    fn draws_are_uniform_over_the_wheel() {
        const DRAWS: u32 = 370_000; // 10,000 expected per pocket
        let mut wheel = OutcomeGenerator::from_seed(7);
        let mut counts = [0u32; 37];
        for _ in 0..DRAWS {
            counts[wheel.spin().winning_number as usize] += 1;
        }
        let expected = f64::from(DRAWS) / 37.0;
        for (pocket, &count) in counts.iter().enumerate() {
            let deviation = (f64::from(count) - expected).abs() / expected;
            assert!(
                deviation < 0.05,
                "pocket {pocket}: {count} draws, {:.1}% off uniform",
                deviation * 100.0
            );
        }
    }
}
