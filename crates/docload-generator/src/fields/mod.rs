//! Field-level value generators used by [`FieldDocumentGenerator`].
//!
//! Fields are declared in benchmark files with a `type` tag and compiled
//! once into a [`Field`] plan, which validates parameters up front.
//!
//! [`FieldDocumentGenerator`]: crate::generator::FieldDocumentGenerator

pub mod numeric;
pub mod pattern;
pub mod reference;
pub mod static_value;

pub use reference::ReferenceView;

use crate::distribution::{DistributionConfig, DistributionError, LongDistribution};
use crate::generator::References;
use docload_core::{CollectionName, IdLong, Value, ID_FIELD};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use serde_yaml::Value as YamlValue;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FieldError {
    #[error("Field '{field}': {reason}")]
    Invalid { field: String, reason: String },

    #[error("Field '{field}': {source}")]
    Distribution {
        field: String,
        #[source]
        source: DistributionError,
    },
}

fn invalid(field: &str, reason: impl Into<String>) -> FieldError {
    FieldError::Invalid {
        field: field.to_string(),
        reason: reason.into(),
    }
}

/// A named field and how to generate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub generator: FieldGenerator,
}

/// Field generator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldGenerator {
    /// The numeric id of the document.
    Id,
    Static {
        value: YamlValue,
    },
    IntRange {
        min: i64,
        max: i64,
    },
    FloatRange {
        min: f64,
        max: f64,
    },
    /// Integer drawn from a distribution.
    Sampled {
        distribution: DistributionConfig,
    },
    Pattern {
        pattern: String,
    },
    AlphaNumeric {
        min_length: usize,
        max_length: usize,
    },
    WeightedBool {
        true_weight: f64,
    },
    OneOf {
        values: Vec<YamlValue>,
    },
    /// Distinct elements sampled from a pool.
    SampleArray {
        pool: Vec<YamlValue>,
        min_length: usize,
        max_length: usize,
    },
    Object {
        fields: Vec<FieldSpec>,
    },
    Null,
    ReferenceIds {
        collection: CollectionName,
    },
    ReferenceId {
        collection: CollectionName,
    },
    Embed {
        collection: CollectionName,
    },
    ReferenceField {
        collection: CollectionName,
        field: String,
    },
    ReferenceCount {
        collection: CollectionName,
    },
}

/// Compiled, validated form of a [`FieldGenerator`].
pub enum Field {
    Id,
    Constant(Value),
    IntRange { min: i64, max: i64 },
    FloatRange { min: f64, max: f64 },
    Sampled(LongDistribution),
    Pattern(String),
    AlphaNumeric { min_length: usize, max_length: usize },
    WeightedBool(f64),
    OneOf(Vec<Value>),
    SampleArray {
        pool: Vec<Value>,
        min_length: usize,
        max_length: usize,
    },
    Object(Vec<(String, Field)>),
    Reference {
        collection: CollectionName,
        view: ReferenceView,
    },
}

impl Field {
    pub fn compile(spec: &FieldSpec) -> Result<Self, FieldError> {
        let name = spec.name.as_str();
        if name.is_empty() {
            return Err(invalid(name, "field name must not be empty"));
        }
        if name == ID_FIELD {
            return Err(invalid(name, "field name is reserved"));
        }
        let field = match &spec.generator {
            FieldGenerator::Id => Field::Id,
            FieldGenerator::Static { value } => Field::Constant(static_value::yaml_to_value(value)),
            FieldGenerator::Null => Field::Constant(Value::Null),
            FieldGenerator::IntRange { min, max } => {
                if min > max {
                    return Err(invalid(name, format!("min {min} is above max {max}")));
                }
                Field::IntRange {
                    min: *min,
                    max: *max,
                }
            }
            FieldGenerator::FloatRange { min, max } => {
                if !(min.is_finite() && max.is_finite() && min <= max) {
                    return Err(invalid(name, format!("invalid float range [{min}, {max}]")));
                }
                Field::FloatRange {
                    min: *min,
                    max: *max,
                }
            }
            FieldGenerator::Sampled { distribution } => {
                Field::Sampled(distribution.build().map_err(|source| {
                    FieldError::Distribution {
                        field: name.to_string(),
                        source,
                    }
                })?)
            }
            FieldGenerator::Pattern { pattern } => Field::Pattern(pattern.clone()),
            FieldGenerator::AlphaNumeric {
                min_length,
                max_length,
            } => {
                if min_length > max_length {
                    return Err(invalid(name, "min_length is above max_length"));
                }
                Field::AlphaNumeric {
                    min_length: *min_length,
                    max_length: *max_length,
                }
            }
            FieldGenerator::WeightedBool { true_weight } => {
                if !(0.0..=1.0).contains(true_weight) {
                    return Err(invalid(name, "true_weight must be in [0, 1]"));
                }
                Field::WeightedBool(*true_weight)
            }
            FieldGenerator::OneOf { values } => {
                if values.is_empty() {
                    return Err(invalid(name, "one_of needs at least one value"));
                }
                Field::OneOf(values.iter().map(static_value::yaml_to_value).collect())
            }
            FieldGenerator::SampleArray {
                pool,
                min_length,
                max_length,
            } => {
                if min_length > max_length {
                    return Err(invalid(name, "min_length is above max_length"));
                }
                Field::SampleArray {
                    pool: pool.iter().map(static_value::yaml_to_value).collect(),
                    min_length: *min_length,
                    max_length: *max_length,
                }
            }
            FieldGenerator::Object { fields } => Field::Object(
                fields
                    .iter()
                    .map(|f| Ok((f.name.clone(), Field::compile(f)?)))
                    .collect::<Result<_, FieldError>>()?,
            ),
            FieldGenerator::ReferenceIds { collection } => {
                Field::reference(collection, ReferenceView::Ids)
            }
            FieldGenerator::ReferenceId { collection } => {
                Field::reference(collection, ReferenceView::FirstId)
            }
            FieldGenerator::Embed { collection } => {
                Field::reference(collection, ReferenceView::Embed)
            }
            FieldGenerator::ReferenceField { collection, field } => Field::reference(
                collection,
                ReferenceView::Field {
                    field: field.clone(),
                },
            ),
            FieldGenerator::ReferenceCount { collection } => {
                Field::reference(collection, ReferenceView::Count)
            }
        };
        Ok(field)
    }

    fn reference(collection: &CollectionName, view: ReferenceView) -> Self {
        Field::Reference {
            collection: collection.clone(),
            view,
        }
    }

    /// Collections whose referenced documents this field reads.
    pub fn referenced_collections(&self, out: &mut Vec<CollectionName>) {
        match self {
            Field::Reference { collection, .. } => {
                if !out.contains(collection) {
                    out.push(collection.clone());
                }
            }
            Field::Object(fields) => {
                for (_, field) in fields {
                    field.referenced_collections(out);
                }
            }
            _ => {}
        }
    }

    pub fn generate(&self, id: IdLong, references: &References, rng: &mut dyn RngCore) -> Value {
        match self {
            Field::Id => Value::Int64(id.value()),
            Field::Constant(value) => value.clone(),
            Field::IntRange { min, max } => numeric::generate_int_range(rng, *min, *max),
            Field::FloatRange { min, max } => numeric::generate_float_range(rng, *min, *max),
            Field::Sampled(distribution) => Value::Int64(distribution.sample(rng)),
            Field::Pattern(pattern) => pattern::generate_pattern(pattern, rng, id),
            Field::AlphaNumeric {
                min_length,
                max_length,
            } => numeric::generate_alphanumeric(rng, *min_length, *max_length),
            Field::WeightedBool(true_weight) => Value::Bool(rng.gen_bool(*true_weight)),
            Field::OneOf(values) => values[rng.gen_range(0..values.len())].clone(),
            Field::SampleArray {
                pool,
                min_length,
                max_length,
            } => {
                let length = rng.gen_range(*min_length..=*max_length).min(pool.len());
                Value::Array(
                    rand::seq::index::sample(rng, pool.len(), length)
                        .into_iter()
                        .map(|i| pool[i].clone())
                        .collect(),
                )
            }
            Field::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(name, field)| (name.clone(), field.generate(id, references, rng)))
                    .collect::<BTreeMap<_, _>>(),
            ),
            Field::Reference { collection, view } => {
                reference::render_references(references, collection, view)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn compile(yaml: &str) -> Result<Field, FieldError> {
        let spec: FieldSpec = serde_yaml::from_str(yaml).unwrap();
        Field::compile(&spec)
    }

    fn generate(field: &Field) -> Value {
        let mut rng = StdRng::seed_from_u64(42);
        field.generate(IdLong::new(7), &References::new(), &mut rng)
    }

    #[test]
    fn test_parse_and_generate() {
        let field = compile("name: n\ngenerator:\n  type: id").unwrap();
        assert_eq!(generate(&field), Value::Int64(7));

        let field = compile("name: s\ngenerator:\n  type: static\n  value: hello").unwrap();
        assert_eq!(generate(&field), Value::from("hello"));

        let field = compile(
            "name: qty\ngenerator:\n  type: sampled\n  distribution:\n    type: constant\n    value: 3",
        )
        .unwrap();
        assert_eq!(generate(&field), Value::Int64(3));

        let field = compile("name: flag\ngenerator:\n  type: weighted_bool\n  true_weight: 1.0")
            .unwrap();
        assert_eq!(generate(&field), Value::Bool(true));
    }

    #[test]
    fn test_sample_array_distinct() {
        let field = compile(
            r#"
name: tags
generator:
  type: sample_array
  pool: [a, b, c, d]
  min_length: 2
  max_length: 3
"#,
        )
        .unwrap();
        let Value::Array(values) = generate(&field) else {
            panic!("Expected array");
        };
        assert!((2..=3).contains(&values.len()));
        let mut sorted: Vec<_> = values.iter().filter_map(Value::as_str).collect();
        sorted.dedup();
        assert_eq!(sorted.len(), values.len());
    }

    #[test]
    fn test_nested_object_collects_references() {
        let field = compile(
            r#"
name: shipping
generator:
  type: object
  fields:
    - name: carrier
      generator:
        type: reference_id
        collection: carriers
    - name: label
      generator:
        type: pattern
        pattern: "LBL-{id}"
"#,
        )
        .unwrap();
        let mut collections = Vec::new();
        field.referenced_collections(&mut collections);
        assert_eq!(collections, vec![CollectionName::new("carriers").unwrap()]);

        let Value::Object(map) = generate(&field) else {
            panic!("Expected object");
        };
        assert_eq!(map["carrier"], Value::Null);
        assert_eq!(map["label"], Value::from("LBL-7"));
    }

    #[test]
    fn test_invalid_fields_rejected() {
        assert!(compile("name: _id\ngenerator:\n  type: id").is_err());
        assert!(compile("name: x\ngenerator:\n  type: int_range\n  min: 5\n  max: 1").is_err());
        assert!(compile("name: x\ngenerator:\n  type: one_of\n  values: []").is_err());
        assert!(matches!(
            compile("name: x\ngenerator:\n  type: sampled\n  distribution:\n    type: geometric\n    p: 2.0"),
            Err(FieldError::Distribution { .. })
        ));
    }
}
