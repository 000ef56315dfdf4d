//! Benchmark definition loaded from YAML.
//!
//! ```yaml
//! name: shop
//! collections:
//!   - name: customers
//!     fields:
//!       - {name: email, generator: {type: pattern, pattern: "user{id}@example.com"}}
//!   - name: orders
//!     fields:
//!       - {name: customer, generator: {type: reference_id, collection: customers}}
//!     references:
//!       - collection: customers
//!         count: {type: constant, value: 1}
//!         ids: {type: uniform_id, max: 10000}
//! load:
//!   targets:
//!     - {collection: orders, count: 1000}
//! operations:
//!   - {name: new_order, type: write, collection: orders, id_offset: 1000000}
//! transaction:
//!   mode: power_test
//!   sequence: [new_order]
//!   repeat: 10
//! ```

use docload_core::CollectionName;
use docload_generator::id_store::DEFAULT_MAX_ID;
use docload_generator::{DistributionConfig, FieldSpec, IdStoreKind, IndexSpec};
use docload_runner::transaction::{MAX_RATE_PER_MS, WEIGHT_EPSILON};
use serde::{Deserialize, Serialize};
use serde_yaml::Value as YamlValue;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read benchmark file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Collection '{0}' is declared more than once")]
    DuplicateCollection(CollectionName),

    #[error("{context} refers to undeclared collection '{collection}'")]
    UnknownCollection {
        context: String,
        collection: CollectionName,
    },

    #[error("Operation '{0}' is declared more than once")]
    DuplicateOperation(String),

    #[error("Transaction phase refers to undeclared operation '{0}'")]
    UnknownOperation(String),

    #[error("Invalid benchmark: {0}")]
    Invalid(String),
}

/// Whether a collection's documents are written or recomputed on demand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionMode {
    #[default]
    Persist,
    Compute,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdStoreConfig {
    #[serde(default)]
    pub kind: IdStoreKind,
    #[serde(default = "default_max_id")]
    pub max_id: u64,
}

impl Default for IdStoreConfig {
    fn default() -> Self {
        Self {
            kind: IdStoreKind::default(),
            max_id: DEFAULT_MAX_ID,
        }
    }
}

fn default_max_id() -> u64 {
    DEFAULT_MAX_ID
}

/// Worker pool sizes. Unset sizes scale with the available cores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    #[serde(default)]
    pub document: Option<usize>,
    #[serde(default)]
    pub refill: Option<usize>,
    #[serde(default)]
    pub load: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub name: CollectionName,
    #[serde(default)]
    pub mode: CollectionMode,
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub references: Vec<ReferenceConfig>,
}

/// One reference edge: how many documents of `collection` and how they are chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceConfig {
    pub collection: CollectionName,
    pub count: DistributionConfig,
    pub ids: DistributionConfig,
    #[serde(default)]
    pub selection: SelectionPolicy,
    #[serde(default)]
    pub buffer: Option<BufferSettings>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Read the document if its id exists, generate it otherwise.
    #[default]
    Simple,
    /// Only ever reference documents that are already persisted.
    Buffered,
    /// Recompute the document from its id.
    Compute,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferSettings {
    pub capacity: Option<usize>,
    pub low_water_mark: Option<usize>,
    pub batch_size: Option<usize>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadConfig {
    #[serde(default = "default_load_timeout")]
    pub timeout_secs: u64,
    pub targets: Vec<LoadTargetConfig>,
}

fn default_load_timeout() -> u64 {
    300
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadTargetConfig {
    pub collection: CollectionName,
    pub count: u64,
    #[serde(default)]
    pub id_offset: i64,
}

/// Named operation available to the transaction phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OperationConfig {
    /// Write a new root document.
    Write {
        name: String,
        collection: CollectionName,
        #[serde(default)]
        id_offset: i64,
    },
    /// Fetch one document by sampled id.
    ReadById {
        name: String,
        collection: CollectionName,
        ids: DistributionConfig,
    },
    /// Fetch documents whose field equals one of `values`.
    ReadFieldEquals {
        name: String,
        collection: CollectionName,
        field: String,
        values: Vec<YamlValue>,
        #[serde(default)]
        limit: Option<usize>,
    },
}

impl OperationConfig {
    pub fn name(&self) -> &str {
        match self {
            OperationConfig::Write { name, .. }
            | OperationConfig::ReadById { name, .. }
            | OperationConfig::ReadFieldEquals { name, .. } => name,
        }
    }

    pub fn collection(&self) -> &CollectionName {
        match self {
            OperationConfig::Write { collection, .. }
            | OperationConfig::ReadById { collection, .. }
            | OperationConfig::ReadFieldEquals { collection, .. } => collection,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TransactionConfig {
    PowerTest {
        sequence: Vec<String>,
        #[serde(default = "default_repeat")]
        repeat: usize,
    },
    WeightedRandom {
        total: u64,
        workers: usize,
        rate_per_ms: f64,
        mix: Vec<MixEntry>,
    },
}

fn default_repeat() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixEntry {
    pub operation: String,
    pub weight: f64,
}

/// Complete benchmark definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    pub name: String,
    #[serde(default)]
    pub id_store: IdStoreConfig,
    #[serde(default)]
    pub pools: PoolConfig,
    pub collections: Vec<CollectionConfig>,
    #[serde(default)]
    pub indexes: Vec<IndexSpec>,
    #[serde(default)]
    pub load: Option<LoadConfig>,
    #[serde(default)]
    pub operations: Vec<OperationConfig>,
    #[serde(default)]
    pub transaction: Option<TransactionConfig>,
}

impl BenchmarkConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: BenchmarkConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn collection(&self, name: &CollectionName) -> Option<&CollectionConfig> {
        self.collections.iter().find(|c| c.name == *name)
    }

    /// Structural checks that need no generation context.
    ///
    /// Anything that would only fail once work is scheduled is rejected
    /// here instead: dangling names, a collection used both as persisted
    /// and computed, ids the id store cannot hold, cycles of computed
    /// references, bad weights or rates, empty pools.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let max_id = self.id_store.max_id;
        if max_id == 0 {
            return Err(ConfigError::Invalid(
                "id store max_id must be at least 1".to_string(),
            ));
        }
        let check_last_id = |what: String, last: Option<u64>| match last {
            Some(last) if last < max_id => Ok(()),
            _ => Err(ConfigError::Invalid(format!(
                "{what} reaches ids outside the id store range [0, {max_id})"
            ))),
        };
        let check_ids = |what: String, ids: &DistributionConfig| match ids.upper_bound() {
            Some(bound) => check_last_id(what, u64::try_from(bound).ok()),
            None => Ok(()),
        };

        let mut modes: HashMap<&CollectionName, CollectionMode> = HashMap::new();
        for collection in &self.collections {
            if modes.insert(&collection.name, collection.mode).is_some() {
                return Err(ConfigError::DuplicateCollection(collection.name.clone()));
            }
        }
        let mode_of = |collection: &CollectionName, context: String| {
            modes
                .get(collection)
                .copied()
                .ok_or_else(|| ConfigError::UnknownCollection {
                    context,
                    collection: collection.clone(),
                })
        };

        for collection in &self.collections {
            for edge in &collection.references {
                let context = format!("reference from '{}'", collection.name);
                let target = mode_of(&edge.collection, context)?;
                let wants = match edge.selection {
                    SelectionPolicy::Compute => CollectionMode::Compute,
                    SelectionPolicy::Simple | SelectionPolicy::Buffered => CollectionMode::Persist,
                };
                if target != wants {
                    return Err(ConfigError::Invalid(format!(
                        "'{}' references '{}' with {:?} selection but that collection is {:?}",
                        collection.name, edge.collection, edge.selection, target
                    )));
                }
                if edge.selection != SelectionPolicy::Compute {
                    check_ids(
                        format!("reference from '{}' to '{}'", collection.name, edge.collection),
                        &edge.ids,
                    )?;
                }
                if edge.buffer.is_some() && edge.selection != SelectionPolicy::Buffered {
                    return Err(ConfigError::Invalid(format!(
                        "buffer settings on the reference from '{}' to '{}' need buffered selection",
                        collection.name, edge.collection
                    )));
                }
            }
        }

        if let Some(cycle) = compute_cycle(&self.collections) {
            let path: Vec<String> = cycle.iter().map(|c| c.to_string()).collect();
            return Err(ConfigError::Invalid(format!(
                "computed references form a cycle: {}",
                path.join(" -> ")
            )));
        }

        for index in &self.indexes {
            mode_of(&index.collection, "index".to_string())?;
        }

        if let Some(load) = &self.load {
            for target in &load.targets {
                let mode = mode_of(&target.collection, "load target".to_string())?;
                if mode != CollectionMode::Persist {
                    return Err(ConfigError::Invalid(format!(
                        "load target '{}' is computed and cannot be written",
                        target.collection
                    )));
                }
                let Ok(offset) = u64::try_from(target.id_offset) else {
                    return Err(ConfigError::Invalid(format!(
                        "load target '{}' has a negative id offset",
                        target.collection
                    )));
                };
                check_last_id(
                    format!("load target '{}'", target.collection),
                    offset.checked_add(target.count),
                )?;
            }
        }

        let mut names = HashSet::new();
        for operation in &self.operations {
            if !names.insert(operation.name()) {
                return Err(ConfigError::DuplicateOperation(operation.name().to_string()));
            }
            let mode = mode_of(
                operation.collection(),
                format!("operation '{}'", operation.name()),
            )?;
            if mode != CollectionMode::Persist {
                return Err(ConfigError::Invalid(format!(
                    "operation '{}' targets computed collection '{}'",
                    operation.name(),
                    operation.collection()
                )));
            }
            match operation {
                OperationConfig::Write { name, id_offset, .. } => {
                    if *id_offset < 0 {
                        return Err(ConfigError::Invalid(format!(
                            "operation '{name}' has a negative id offset"
                        )));
                    }
                }
                OperationConfig::ReadById { name, ids, .. } => {
                    check_ids(format!("operation '{name}'"), ids)?;
                }
                OperationConfig::ReadFieldEquals { .. } => {}
            }
        }

        match &self.transaction {
            Some(TransactionConfig::PowerTest { sequence, repeat }) => {
                if *repeat == 0 {
                    return Err(ConfigError::Invalid(
                        "power test repeat count must be at least 1".to_string(),
                    ));
                }
                for name in sequence {
                    if !names.contains(name.as_str()) {
                        return Err(ConfigError::UnknownOperation(name.clone()));
                    }
                }
            }
            Some(TransactionConfig::WeightedRandom {
                workers,
                rate_per_ms,
                mix,
                ..
            }) => {
                if *workers == 0 {
                    return Err(ConfigError::Invalid(
                        "transaction workers must be at least 1".to_string(),
                    ));
                }
                if !(*rate_per_ms > 0.0 && *rate_per_ms < MAX_RATE_PER_MS) {
                    return Err(ConfigError::Invalid(format!(
                        "rate {rate_per_ms} ops/ms must be in (0, {MAX_RATE_PER_MS})"
                    )));
                }
                for entry in mix {
                    if !names.contains(entry.operation.as_str()) {
                        return Err(ConfigError::UnknownOperation(entry.operation.clone()));
                    }
                }
                let sum: f64 = mix.iter().map(|m| m.weight).sum();
                if mix.iter().any(|m| m.weight < 0.0) || (sum - 1.0).abs() > WEIGHT_EPSILON {
                    return Err(ConfigError::Invalid(format!(
                        "operation weights must be non-negative and sum to 1, got {sum}"
                    )));
                }
            }
            None => {}
        }

        for operation in &self.operations {
            if let OperationConfig::Write { name, id_offset, .. } = operation {
                let writes = self.transaction_runs(name);
                check_last_id(
                    format!("operation '{name}'"),
                    u64::try_from(*id_offset)
                        .ok()
                        .and_then(|offset| offset.checked_add(writes.max(1))),
                )?;
            }
        }

        let pools = [
            ("document", self.pools.document),
            ("refill", self.pools.refill),
            ("load", self.pools.load),
        ];
        if let Some((pool, _)) = pools.iter().find(|(_, size)| *size == Some(0)) {
            return Err(ConfigError::Invalid(format!("{pool} pool size must be at least 1")));
        }
        Ok(())
    }

    /// Most times the transaction phase can run the named operation.
    fn transaction_runs(&self, operation: &str) -> u64 {
        match &self.transaction {
            Some(TransactionConfig::PowerTest { sequence, repeat }) => {
                let per_pass = sequence.iter().filter(|name| *name == operation).count();
                (per_pass as u64).saturating_mul(*repeat as u64)
            }
            Some(TransactionConfig::WeightedRandom { total, mix, .. }) => {
                if mix.iter().any(|m| m.operation == operation && m.weight > 0.0) {
                    *total
                } else {
                    0
                }
            }
            None => 0,
        }
    }
}

/// First cycle among `compute` references, as the path that closes it.
fn compute_cycle(collections: &[CollectionConfig]) -> Option<Vec<&CollectionName>> {
    let edges: HashMap<&CollectionName, Vec<&CollectionName>> = collections
        .iter()
        .map(|collection| {
            let targets = collection
                .references
                .iter()
                .filter(|edge| edge.selection == SelectionPolicy::Compute)
                .map(|edge| &edge.collection)
                .collect();
            (&collection.name, targets)
        })
        .collect();

    fn visit<'a>(
        node: &'a CollectionName,
        edges: &HashMap<&'a CollectionName, Vec<&'a CollectionName>>,
        path: &mut Vec<&'a CollectionName>,
        finished: &mut HashSet<&'a CollectionName>,
    ) -> Option<Vec<&'a CollectionName>> {
        if let Some(start) = path.iter().position(|n| *n == node) {
            let mut cycle = path[start..].to_vec();
            cycle.push(node);
            return Some(cycle);
        }
        if finished.contains(&node) {
            return None;
        }
        path.push(node);
        for target in edges.get(&node).into_iter().flatten().copied() {
            if let Some(cycle) = visit(target, edges, path, finished) {
                return Some(cycle);
            }
        }
        path.pop();
        finished.insert(node);
        None
    }

    let mut finished = HashSet::new();
    collections
        .iter()
        .find_map(|collection| visit(&collection.name, &edges, &mut Vec::new(), &mut finished))
}
