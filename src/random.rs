use rand::Rng;

const MULTIPLIER_A: i64 = 1103515245;
const INCREMENT_C: i64 = 12345;
const DEFAULT_SEED: i64 = 3819201;

/// Source of every random decision the search makes: tie-breaks, expansion picks and
/// rollout moves.
pub trait RandomGenerator: Default {
    fn next(&mut self) -> i32;

    /// Returns a value in `from..to`. `to` must be greater than `from`.
    fn next_range(&mut self, from: usize, to: usize) -> usize;

    /// Picks one element uniformly. The slice must not be empty.
    fn choose<'a, K>(&mut self, items: &'a [K]) -> &'a K {
        &items[self.next_range(0, items.len())]
    }
}

/// Thread-local generator from `rand`. Used by default.
#[derive(Default)]
pub struct StandardRandomGenerator;

impl RandomGenerator for StandardRandomGenerator {
    fn next(&mut self) -> i32 {
        rand::random()
    }

    fn next_range(&mut self, from: usize, to: usize) -> usize {
        rand::rng().random_range(from..to)
    }
}

/// Linear congruential generator with a fixed seed, for reproducible searches.
pub struct CustomNumberGenerator {
    seed: i64,
}

impl Default for CustomNumberGenerator {
    fn default() -> Self {
        CustomNumberGenerator::new(DEFAULT_SEED)
    }
}

impl RandomGenerator for CustomNumberGenerator {
    fn next(&mut self) -> i32 {
        self.seed = (self.seed * MULTIPLIER_A + INCREMENT_C) % (i32::MAX as i64);
        self.seed as i32
    }

    fn next_range(&mut self, from: usize, to: usize) -> usize {
        let span = (to - from) as i64;
        (self.next() as i64 % span).unsigned_abs() as usize + from
    }
}

impl CustomNumberGenerator {
    pub const fn new(seed: i64) -> Self {
        Self { seed }
    }
}
