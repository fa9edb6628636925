//! Randomized wait time between incidents

use oncall_config::{
    IntervalBucket, MAX_INTERVAL_SECONDS, MIN_INTERVAL_SECONDS, default_interval_buckets,
};
use rand::Rng;

/// Draws the wait before the next incident from a weighted bucket table.
///
/// A bucket is picked by weight, then a whole number of seconds is drawn
/// uniformly from its half-open range. Results always fall inside
/// `[MIN_INTERVAL_SECONDS, MAX_INTERVAL_SECONDS]`.
#[derive(Debug, Clone)]
pub struct IntervalSampler {
    buckets: Vec<IntervalBucket>,
    total_weight: f64,
}

impl IntervalSampler {
    /// Build a sampler from a validated bucket table
    pub fn new(buckets: Vec<IntervalBucket>) -> Self {
        let total_weight = buckets.iter().map(|b| b.weight).sum();
        Self {
            buckets,
            total_weight,
        }
    }

    pub fn buckets(&self) -> &[IntervalBucket] {
        &self.buckets
    }

    /// Draw a delay in seconds
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        let Some(bucket) = self.pick(rng) else {
            return MIN_INTERVAL_SECONDS;
        };

        let delay = if bucket.min_seconds < bucket.max_seconds {
            rng.gen_range(bucket.min_seconds..bucket.max_seconds)
        } else {
            bucket.min_seconds
        };

        delay.clamp(MIN_INTERVAL_SECONDS, MAX_INTERVAL_SECONDS)
    }

    fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&IntervalBucket> {
        let roll = rng.r#gen::<f64>() * self.total_weight;

        let mut cumulative = 0.0;
        for bucket in &self.buckets {
            cumulative += bucket.weight;
            if roll < cumulative {
                return Some(bucket);
            }
        }

        // Rounding can leave the roll a hair above the last boundary
        self.buckets.last()
    }
}

impl Default for IntervalSampler {
    fn default() -> Self {
        Self::new(default_interval_buckets())
    }
}
