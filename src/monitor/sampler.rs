//! Injectable sampling policies. Both are deterministic given a seed / start.

use rand::rngs::StdRng;
use rand::SeedableRng;

pub trait SamplingPolicy: Send {
    /// Up to `n` distinct indices into a pool of `len` items.
    fn pick(&mut self, len: usize, n: usize) -> Vec<usize>;
}

/// Uniform sampling without replacement.
pub struct RandomSampler {
    rng: StdRng,
}

impl RandomSampler {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn new(seed: Option<u64>) -> Self {
        seed.map(Self::seeded).unwrap_or_else(Self::from_entropy)
    }
}

impl SamplingPolicy for RandomSampler {
    fn pick(&mut self, len: usize, n: usize) -> Vec<usize> {
        if len == 0 {
            return Vec::new();
        }
        rand::seq::index::sample(&mut self.rng, len, n.min(len)).into_vec()
    }
}

/// Walks the pool in order, wrapping around.
#[derive(Default)]
pub struct RoundRobinSampler {
    next: usize,
}

impl SamplingPolicy for RoundRobinSampler {
    fn pick(&mut self, len: usize, n: usize) -> Vec<usize> {
        if len == 0 {
            return Vec::new();
        }
        let out = (0..n.min(len)).map(|i| (self.next + i) % len).collect();
        self.next = (self.next + n.min(len)) % len;
        out
    }
}
