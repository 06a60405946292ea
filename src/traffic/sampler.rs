use crate::Millis;
use crate::Rate;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use rand_distr::Distribution;
use rand_distr::Exp;

/// the single source of randomness for a run. inter-arrival gaps,
/// session durations, demand draws, and placement tie-breaks all
/// pull from this one stream in a fixed order, so a seed fully
/// determines the simulation. unseeded runs draw from OS entropy
/// and are not reproducible.
pub struct Sampler {
    rng: SmallRng,
}

impl Sampler {
    /// exponential draw with the given rate (mean 1/rate)
    pub fn expo(&mut self, rate: Rate) -> f64 {
        Exp::new(rate)
            .expect("rates are validated positive")
            .sample(&mut self.rng)
    }

    /// exponential draw scaled to milliseconds
    pub fn expo_ms(&mut self, rate: Rate) -> Millis {
        self.expo(rate) * 1000.
    }

    /// uniform choice among a non-empty candidate set
    pub fn choice<'a, T>(&mut self, options: &'a [T]) -> &'a T {
        options
            .choose(&mut self.rng)
            .expect("choice over a non-empty set")
    }
}

impl From<Option<u64>> for Sampler {
    fn from(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        Self { rng }
    }
}
