use super::{Distribution, DistributionError, LongDistribution};
use rand::{Rng, RngCore};

/// Finite set of values with explicit, unnormalized weights.
///
/// A draw `u` in `[0, total)` selects the first value whose cumulative
/// weight is strictly greater than `u`.
#[derive(Debug, Clone)]
pub struct Enumerated<T> {
    values: Vec<T>,
    cumulative: Vec<f64>,
}

impl<T> Enumerated<T> {
    pub fn new(weighted: Vec<(T, f64)>) -> Result<Self, DistributionError> {
        if weighted.is_empty() {
            return Err(DistributionError::invalid("weighted", "no values given"));
        }
        let mut values = Vec::with_capacity(weighted.len());
        let mut cumulative = Vec::with_capacity(weighted.len());
        let mut total = 0.0;
        for (value, weight) in weighted {
            if !weight.is_finite() || weight < 0.0 {
                return Err(DistributionError::invalid(
                    "weighted",
                    format!("weight {weight} must be finite and non-negative"),
                ));
            }
            total += weight;
            values.push(value);
            cumulative.push(total);
        }
        if total <= 0.0 {
            return Err(DistributionError::invalid(
                "weighted",
                "weights must sum to a positive value",
            ));
        }
        Ok(Self { values, cumulative })
    }

    pub fn total_weight(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or_default()
    }

    /// Value selected by a draw in `[0, total_weight)`.
    pub fn select(&self, draw: f64) -> &T {
        let index = self
            .cumulative
            .partition_point(|c| *c <= draw)
            .min(self.values.len() - 1);
        &self.values[index]
    }
}

impl<T: Clone + Send + Sync> Distribution<T> for Enumerated<T> {
    fn sample(&self, rng: &mut dyn RngCore) -> T {
        let draw = rng.gen::<f64>() * self.total_weight();
        self.select(draw).clone()
    }
}

/// Uniform choice over a finite, non-empty set.
#[derive(Debug, Clone)]
pub struct UniformChoice<T> {
    values: Vec<T>,
}

impl<T> UniformChoice<T> {
    pub fn new(values: Vec<T>) -> Result<Self, DistributionError> {
        if values.is_empty() {
            return Err(DistributionError::invalid("one_of", "no values given"));
        }
        Ok(Self { values })
    }
}

impl<T: Clone + Send + Sync> Distribution<T> for UniformChoice<T> {
    fn sample(&self, rng: &mut dyn RngCore) -> T {
        self.values[rng.gen_range(0..self.values.len())].clone()
    }
}

/// Draws `k` distinct values from a pool, with `k` itself sampled.
pub struct SampleNonRepeating<T> {
    pool: Vec<T>,
    count: LongDistribution,
}

impl<T> SampleNonRepeating<T> {
    pub fn new(pool: Vec<T>, count: LongDistribution) -> Self {
        Self { pool, count }
    }
}

impl<T: Clone + Send + Sync> Distribution<Vec<T>> for SampleNonRepeating<T> {
    fn sample(&self, rng: &mut dyn RngCore) -> Vec<T> {
        let k = usize::try_from(self.count.sample(rng))
            .unwrap_or(0)
            .min(self.pool.len());
        rand::seq::index::sample(rng, self.pool.len(), k)
            .into_iter()
            .map(|i| self.pool[i].clone())
            .collect()
    }

    fn is_repeatable(&self) -> bool {
        self.count.is_repeatable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::Constant;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_cumulative_selection() {
        let dist = Enumerated::new(vec![("a", 1.0), ("b", 2.0), ("c", 1.0)]).unwrap();
        assert_eq!(dist.total_weight(), 4.0);
        assert_eq!(*dist.select(0.0), "a");
        assert_eq!(*dist.select(0.999), "a");
        assert_eq!(*dist.select(1.0), "b");
        assert_eq!(*dist.select(2.5), "b");
        assert_eq!(*dist.select(3.0), "c");
        // Draws at or past the total fall back to the last value.
        assert_eq!(*dist.select(4.0), "c");
    }

    #[test]
    fn test_zero_weight_never_selected() {
        let mut rng = StdRng::seed_from_u64(42);
        let dist = Enumerated::new(vec![(1, 0.0), (2, 5.0)]).unwrap();
        for _ in 0..1000 {
            assert_eq!(dist.sample(&mut rng), 2);
        }
    }

    #[test]
    fn test_weighted_rejects_invalid() {
        assert!(Enumerated::<i32>::new(vec![]).is_err());
        assert!(Enumerated::new(vec![(1, 0.0)]).is_err());
        assert!(Enumerated::new(vec![(1, -1.0), (2, 3.0)]).is_err());
    }

    #[test]
    fn test_uniform_choice_covers_all() {
        let mut rng = StdRng::seed_from_u64(42);
        let dist = UniformChoice::new(vec![1, 2, 3]).unwrap();
        let seen: HashSet<i32> = (0..200).map(|_| dist.sample(&mut rng)).collect();
        assert_eq!(seen.len(), 3);
        assert!(UniformChoice::<i32>::new(vec![]).is_err());
    }

    #[test]
    fn test_sample_non_repeating() {
        let mut rng = StdRng::seed_from_u64(42);
        let dist = SampleNonRepeating::new((0..10).collect(), Arc::new(Constant(4i64)));
        for _ in 0..100 {
            let picked = dist.sample(&mut rng);
            assert_eq!(picked.len(), 4);
            assert_eq!(picked.iter().collect::<HashSet<_>>().len(), 4);
        }
        let capped = SampleNonRepeating::new(vec!['x', 'y'], Arc::new(Constant(5i64)));
        assert_eq!(capped.sample(&mut rng).len(), 2);
    }
}
