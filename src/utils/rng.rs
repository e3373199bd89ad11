//! Seedable pseudo-random source for weight synthesis.
//!
//! Xorshift64 keeps synthesis reproducible for a given seed without pulling in a
//! cryptographic generator. The engine only ever draws small bounded integers from it.

use std::time::{SystemTime, UNIX_EPOCH};

/// State used when a caller passes seed 0, which xorshift cannot leave.
const ZERO_SEED_STATE: u64 = 0x9e3779b97f4a7c15;

/// Xorshift64 generator.
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    /// Seeded generator. Seed 0 is mapped to a fixed non-zero state.
    pub fn new(seed: u64) -> Self {
        Self {
            state: non_zero(seed),
        }
    }

    /// Generator seeded from the wall clock, for runs without a configured seed.
    pub fn from_time() -> Self {
        Self::new(clock_seed())
    }

    /// `Some(seed)` behaves like [`new`](Self::new), `None` like [`from_time`](Self::from_time).
    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_time, Self::new)
    }

    fn step(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// High 32 bits of the next state.
    pub fn next_u32(&mut self) -> u32 {
        (self.step() >> 32) as u32
    }

    /// Draw in `[0, upper)`; always 0 when `upper` is 0.
    pub fn gen_usize(&mut self, upper: usize) -> usize {
        match upper {
            0 => 0,
            _ => self.next_u32() as usize % upper,
        }
    }
}

fn non_zero(seed: u64) -> u64 {
    if seed == 0 {
        ZERO_SEED_STATE
    } else {
        seed
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or(0)
}
