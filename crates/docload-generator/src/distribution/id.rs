use super::{Distribution, DistributionError, LongDistribution};
use rand::{Rng, RngCore};
use std::sync::atomic::{AtomicI64, Ordering};

/// Uniform id in `[0, max)`.
#[derive(Debug, Clone)]
pub struct UniformId {
    max: i64,
}

impl UniformId {
    pub fn new(max: i64) -> Result<Self, DistributionError> {
        if max <= 0 {
            return Err(DistributionError::invalid(
                "uniform_id",
                format!("max {max} must be positive"),
            ));
        }
        Ok(Self { max })
    }
}

impl Distribution<i64> for UniformId {
    fn sample(&self, rng: &mut dyn RngCore) -> i64 {
        rng.gen_range(0..self.max)
    }
}

/// Hands out consecutive ids from a shared counter. Not repeatable.
#[derive(Debug)]
pub struct SequentialId {
    next: AtomicI64,
}

impl SequentialId {
    pub fn new(start: i64) -> Self {
        Self {
            next: AtomicI64::new(start),
        }
    }
}

impl Distribution<i64> for SequentialId {
    fn sample(&self, _rng: &mut dyn RngCore) -> i64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    fn is_repeatable(&self) -> bool {
        false
    }
}

/// Offsets every id of the inner sampler by a non-negative constant.
pub struct OffsetId {
    offset: i64,
    inner: LongDistribution,
}

impl OffsetId {
    pub fn new(offset: i64, inner: LongDistribution) -> Result<Self, DistributionError> {
        if offset < 0 {
            return Err(DistributionError::invalid(
                "offset",
                format!("offset {offset} must not be negative"),
            ));
        }
        Ok(Self { offset, inner })
    }
}

impl Distribution<i64> for OffsetId {
    fn sample(&self, rng: &mut dyn RngCore) -> i64 {
        self.inner.sample(rng).saturating_add(self.offset)
    }

    fn is_repeatable(&self) -> bool {
        self.inner.is_repeatable()
    }
}
