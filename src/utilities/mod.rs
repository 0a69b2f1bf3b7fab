/////////////////////////////////////////////////////////////////////////////////////
//
// Outbreak model
//
// utilities module
//
// random draws used across the model: contact rates and coin flips
//
////////////////////////////////////////////////////////////////////////////////////

use super::error::OutbreakError;
use rand::Rng;
use rand_distr::{Distribution, Geometric};

// Contact rates are geometric with support starting at 0 and mean r0,
// i.e. success probability 1/(r0 + 1). As r0 shrinks towards 0 every draw
// becomes 0 and nobody passes the infection on.
#[derive(Debug, Clone, Copy)]
pub struct ContactRateSampler {
    success_probability: f64,
    distribution: Geometric,
}

impl ContactRateSampler {
    pub fn new(r0: f64) -> Result<ContactRateSampler, OutbreakError> {
        if !r0.is_finite() || r0 <= 0.0 {
            return Err(OutbreakError::config(format!(
                "r0 must be a positive number, got {}",
                r0
            )));
        }
        ContactRateSampler::with_mean(r0)
    }

    // sampler whose draws average `mean` - newborns use the population mean
    pub fn with_mean(mean: f64) -> Result<ContactRateSampler, OutbreakError> {
        if !mean.is_finite() || mean < 0.0 {
            return Err(OutbreakError::config(format!(
                "mean contact rate must be non-negative, got {}",
                mean
            )));
        }
        ContactRateSampler::from_probability(1.0 / (mean + 1.0))
    }

    fn from_probability(p: f64) -> Result<ContactRateSampler, OutbreakError> {
        let distribution = Geometric::new(p)
            .map_err(|e| OutbreakError::config(format!("geometric p={} - {:?}", p, e)))?;
        Ok(ContactRateSampler {
            success_probability: p,
            distribution,
        })
    }

    pub fn success_probability(&self) -> f64 {
        self.success_probability
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.distribution.sample(rng) as usize
    }

    pub fn sample_n<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<usize> {
        (0..count).map(|_| self.sample(rng)).collect()
    }
}

// Bernoulli draw on an integer percentage (0 - 100)
pub fn percent_chance<R: Rng + ?Sized>(percent: u32, rng: &mut R) -> bool {
    chance(f64::from(percent) / 100.0, rng)
}

// Bernoulli draw on a probability, clamped to [0, 1]
pub fn chance<R: Rng + ?Sized>(probability: f64, rng: &mut R) -> bool {
    if probability <= 0.0 || probability.is_nan() {
        false
    } else if probability >= 1.0 {
        true
    } else {
        rng.gen_bool(probability)
    }
}
