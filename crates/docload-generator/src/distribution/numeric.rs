use super::{Distribution, DistributionError, LongDistribution};
use rand::{Rng, RngCore};
use rand_distr::Distribution as _;

/// Always yields the same value.
#[derive(Debug, Clone)]
pub struct Constant<T>(pub T);

impl<T: Clone + Send + Sync> Distribution<T> for Constant<T> {
    fn sample(&self, _rng: &mut dyn RngCore) -> T {
        self.0.clone()
    }
}

/// Uniform integer in `[lower, upper)`.
#[derive(Debug, Clone)]
pub struct UniformRange {
    lower: i64,
    upper: i64,
}

impl UniformRange {
    pub fn new(lower: i64, upper: i64) -> Result<Self, DistributionError> {
        if lower >= upper {
            return Err(DistributionError::invalid(
                "uniform",
                format!("lower bound {lower} must be below upper bound {upper}"),
            ));
        }
        Ok(Self { lower, upper })
    }
}

impl Distribution<i64> for UniformRange {
    fn sample(&self, rng: &mut dyn RngCore) -> i64 {
        rng.gen_range(self.lower..self.upper)
    }
}

/// Number of failures before the first success of a Bernoulli(p) trial.
///
/// Support is {0, 1, 2, ...} with mean `(1 - p) / p`.
#[derive(Debug, Clone)]
pub struct Geometric {
    p: f64,
    inner: rand_distr::Geometric,
}

impl Geometric {
    pub fn new(p: f64) -> Result<Self, DistributionError> {
        if !(p > 0.0 && p <= 1.0) {
            return Err(DistributionError::invalid(
                "geometric",
                format!("success probability {p} must be in (0, 1]"),
            ));
        }
        let inner = rand_distr::Geometric::new(p)
            .map_err(|e| DistributionError::invalid("geometric", e.to_string()))?;
        Ok(Self { p, inner })
    }

    pub fn p(&self) -> f64 {
        self.p
    }
}

impl Distribution<i64> for Geometric {
    fn sample(&self, rng: &mut dyn RngCore) -> i64 {
        let failures: u64 = self.inner.sample(rng);
        i64::try_from(failures).unwrap_or(i64::MAX)
    }
}

/// Adds a non-negative constant to every draw of the inner sampler.
pub struct Shift {
    shift: i64,
    inner: LongDistribution,
}

impl Shift {
    pub fn new(shift: i64, inner: LongDistribution) -> Result<Self, DistributionError> {
        if shift < 0 {
            return Err(DistributionError::invalid(
                "shift",
                format!("shift {shift} must not be negative"),
            ));
        }
        Ok(Self { shift, inner })
    }
}

impl Distribution<i64> for Shift {
    fn sample(&self, rng: &mut dyn RngCore) -> i64 {
        self.inner.sample(rng).saturating_add(self.shift)
    }

    fn is_repeatable(&self) -> bool {
        self.inner.is_repeatable()
    }
}

/// Zero with probability `p_zero`, otherwise a draw from the inner sampler.
pub struct ZeroOrElse {
    p_zero: f64,
    inner: LongDistribution,
}

impl ZeroOrElse {
    pub fn new(p_zero: f64, inner: LongDistribution) -> Result<Self, DistributionError> {
        if !(0.0..=1.0).contains(&p_zero) {
            return Err(DistributionError::invalid(
                "zero_or_else",
                format!("probability {p_zero} must be in [0, 1]"),
            ));
        }
        Ok(Self { p_zero, inner })
    }
}

impl Distribution<i64> for ZeroOrElse {
    fn sample(&self, rng: &mut dyn RngCore) -> i64 {
        if rng.gen::<f64>() < self.p_zero {
            0
        } else {
            self.inner.sample(rng)
        }
    }

    fn is_repeatable(&self) -> bool {
        self.inner.is_repeatable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn mean(dist: &dyn Distribution<i64>, samples: usize, rng: &mut StdRng) -> f64 {
        (0..samples).map(|_| dist.sample(rng) as f64).sum::<f64>() / samples as f64
    }

    #[test]
    fn test_geometric_mean_half() {
        let mut rng = StdRng::seed_from_u64(42);
        let dist = Geometric::new(0.5).unwrap();
        let actual = mean(&dist, 50_000, &mut rng);
        assert!((actual - 1.0).abs() < 0.1, "mean {actual}");
    }

    #[test]
    fn test_geometric_mean() {
        let mut rng = StdRng::seed_from_u64(42);
        for p in [0.1, 0.5, 0.8, 1.0] {
            let dist = Geometric::new(p).unwrap();
            let expected = (1.0 - p) / p;
            let actual = mean(&dist, 200_000, &mut rng);
            assert!(
                (actual - expected).abs() < 0.1,
                "p={p}: expected mean {expected}, got {actual}"
            );
        }
    }

    #[test]
    fn test_geometric_rejects_bad_probability() {
        assert!(Geometric::new(0.0).is_err());
        assert!(Geometric::new(1.5).is_err());
        assert!(Geometric::new(f64::NAN).is_err());
        assert!(Geometric::new(1.0).is_ok());
    }

    #[test]
    fn test_geometric_certain_success_is_zero() {
        let mut rng = StdRng::seed_from_u64(5);
        let dist = Geometric::new(1.0).unwrap();
        assert!((0..100).all(|_| dist.sample(&mut rng) == 0));
    }

    #[test]
    fn test_uniform_range_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let dist = UniformRange::new(3, 6).unwrap();
        for _ in 0..1000 {
            assert!((3..6).contains(&dist.sample(&mut rng)));
        }
        assert!(UniformRange::new(5, 5).is_err());
    }

    #[test]
    fn test_shift() {
        let mut rng = StdRng::seed_from_u64(1);
        let dist = Shift::new(10, Arc::new(Constant(5i64))).unwrap();
        assert_eq!(dist.sample(&mut rng), 15);
        assert!(Shift::new(-1, Arc::new(Constant(5i64))).is_err());
    }

    #[test]
    fn test_zero_or_else_fraction() {
        let mut rng = StdRng::seed_from_u64(42);
        let dist = ZeroOrElse::new(0.3, Arc::new(Constant(1i64))).unwrap();
        let zeros = (0..10_000).filter(|_| dist.sample(&mut rng) == 0).count();
        let fraction = zeros as f64 / 10_000.0;
        assert!((fraction - 0.3).abs() < 0.02, "zero fraction {fraction}");
    }

    #[test]
    fn test_zero_or_else_extremes() {
        let mut rng = StdRng::seed_from_u64(3);
        let never = ZeroOrElse::new(0.0, Arc::new(Constant(9i64))).unwrap();
        let always = ZeroOrElse::new(1.0, Arc::new(Constant(9i64))).unwrap();
        for _ in 0..100 {
            assert_eq!(never.sample(&mut rng), 9);
            assert_eq!(always.sample(&mut rng), 0);
        }
        assert!(ZeroOrElse::new(1.1, Arc::new(Constant(0i64))).is_err());
    }
}
