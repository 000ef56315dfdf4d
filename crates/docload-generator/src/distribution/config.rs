use super::{
    Constant, DistributionError, Enumerated, Geometric, LongDistribution, OffsetId, SequentialId,
    Shift, UniformChoice, UniformId, UniformRange, ZeroOrElse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Declarative form of an integer sampler, as written in benchmark files.
///
/// ```yaml
/// type: zero_or_else
/// p_zero: 0.2
/// inner:
///   type: geometric
///   p: 0.5
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DistributionConfig {
    Constant {
        value: i64,
    },
    Uniform {
        lower: i64,
        upper: i64,
    },
    Geometric {
        p: f64,
    },
    Shift {
        shift: i64,
        inner: Box<DistributionConfig>,
    },
    ZeroOrElse {
        p_zero: f64,
        inner: Box<DistributionConfig>,
    },
    Weighted {
        values: Vec<WeightedValue>,
    },
    OneOf {
        values: Vec<i64>,
    },
    UniformId {
        max: i64,
    },
    Sequential {
        #[serde(default)]
        start: i64,
    },
    Offset {
        offset: i64,
        inner: Box<DistributionConfig>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedValue {
    pub value: i64,
    pub weight: f64,
}

impl DistributionConfig {
    pub fn build(&self) -> Result<LongDistribution, DistributionError> {
        let distribution: LongDistribution = match self {
            DistributionConfig::Constant { value } => Arc::new(Constant(*value)),
            DistributionConfig::Uniform { lower, upper } => {
                Arc::new(UniformRange::new(*lower, *upper)?)
            }
            DistributionConfig::Geometric { p } => Arc::new(Geometric::new(*p)?),
            DistributionConfig::Shift { shift, inner } => {
                Arc::new(Shift::new(*shift, inner.build()?)?)
            }
            DistributionConfig::ZeroOrElse { p_zero, inner } => {
                Arc::new(ZeroOrElse::new(*p_zero, inner.build()?)?)
            }
            DistributionConfig::Weighted { values } => Arc::new(Enumerated::new(
                values.iter().map(|v| (v.value, v.weight)).collect(),
            )?),
            DistributionConfig::OneOf { values } => Arc::new(UniformChoice::new(values.clone())?),
            DistributionConfig::UniformId { max } => Arc::new(UniformId::new(*max)?),
            DistributionConfig::Sequential { start } => Arc::new(SequentialId::new(*start)),
            DistributionConfig::Offset { offset, inner } => {
                Arc::new(OffsetId::new(*offset, inner.build()?)?)
            }
        };
        Ok(distribution)
    }

    /// Largest value the sampler can yield, or `None` when unbounded.
    pub fn upper_bound(&self) -> Option<i64> {
        match self {
            DistributionConfig::Constant { value } => Some(*value),
            DistributionConfig::Uniform { upper, .. } => Some(upper.saturating_sub(1)),
            DistributionConfig::Geometric { .. } | DistributionConfig::Sequential { .. } => None,
            DistributionConfig::Shift { shift, inner } => {
                inner.upper_bound().map(|b| b.saturating_add(*shift))
            }
            DistributionConfig::Offset { offset, inner } => {
                inner.upper_bound().map(|b| b.saturating_add(*offset))
            }
            DistributionConfig::ZeroOrElse { inner, .. } => inner.upper_bound().map(|b| b.max(0)),
            DistributionConfig::Weighted { values } => values.iter().map(|v| v.value).max(),
            DistributionConfig::OneOf { values } => values.iter().copied().max(),
            DistributionConfig::UniformId { max } => Some(max.saturating_sub(1)),
        }
    }
}
