//! `random` opcode support: a normal PRNG plus the predictable mode the
//! standard requires for negative/zero seed arguments.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

enum Mode {
    Random(StdRng),
    /// Cycles 1..=range in order; reset to 1 whenever reseeded.
    Predictable { range: i16, next: i16 },
}

pub struct ZRandom {
    mode: Mode,
}

impl ZRandom {
    pub fn new() -> Self {
        ZRandom {
            mode: Mode::Random(StdRng::from_entropy()),
        }
    }

    /// Implements the `random` opcode's argument semantics: positive range
    /// draws a uniform value in `1..=range`, zero reseeds unpredictably,
    /// negative seeds a predictable cycle of length `-range`.
    pub fn random(&mut self, range: i16) -> i16 {
        match range.cmp(&0) {
            std::cmp::Ordering::Greater => match &mut self.mode {
                Mode::Random(rng) => rng.gen_range(1..=range),
                Mode::Predictable { range: cycle, next } => {
                    let value = *next;
                    *next = if *next >= *cycle { 1 } else { *next + 1 };
                    value
                }
            },
            std::cmp::Ordering::Equal => {
                self.mode = Mode::Random(StdRng::from_entropy());
                0
            }
            std::cmp::Ordering::Less => {
                self.mode = Mode::Predictable {
                    range: -range,
                    next: 1,
                };
                0
            }
        }
    }
}

impl Default for ZRandom {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_range_stays_in_bounds() {
        let mut r = ZRandom::new();
        for _ in 0..50 {
            let v = r.random(6);
            assert!((1..=6).contains(&v));
        }
    }

    #[test]
    fn negative_seed_then_positive_draws_cycle() {
        let mut r = ZRandom::new();
        assert_eq!(r.random(-3), 0);
        assert_eq!(r.random(10), 1);
        assert_eq!(r.random(10), 2);
        assert_eq!(r.random(10), 3);
        assert_eq!(r.random(10), 1);
    }
}
