//! Test doubles for the engine.

use std::collections::VecDeque;

use spindle_types::Outcome;

use crate::wheel::Wheel;

/// Wheel that plays back a fixed sequence of pocket numbers.
#[derive(Clone, Debug)]
pub struct FixedWheel {
    draws: VecDeque<u8>,
}

impl FixedWheel {
    /// Panics on a number not on the wheel.
    pub fn new(numbers: &[u8]) -> Self {
        assert!(numbers.iter().all(|&n| n <= 36), "pocket off the wheel");
        Self {
            draws: numbers.iter().copied().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.draws.len()
    }
}

impl Wheel for FixedWheel {
    fn spin(&mut self) -> Outcome {
        let number = self.draws.pop_front().expect("fixed wheel exhausted");
        Outcome::of(number).expect("pocket checked at construction")
    }
}
