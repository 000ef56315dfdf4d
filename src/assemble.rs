//! Wires a [`BenchmarkConfig`] into a runnable [`Benchmark`].

use crate::config::{
    BenchmarkConfig, BufferSettings, CollectionConfig, CollectionMode, OperationConfig,
    ReferenceConfig, SelectionPolicy, TransactionConfig,
};
use anyhow::{Context, Result};
use docload_core::Value;
use docload_generator::distribution::UniformChoice;
use docload_generator::fields::static_value::yaml_to_value;
use docload_generator::{
    BufferConfig, BufferedDocumentDistribution, ComputeDocumentDistribution, DocumentDistribution,
    FieldDocumentGenerator, GenerationContext, GenerationSpecification, PhaseTopic,
    PrimaryWriteSpecification, ReferenceDistribution, SimpleDocumentDistribution, Storage,
    WorkerPool,
};
use docload_runner::{
    Benchmark, IndexPhase, LoadPhase, OperationRegistry, PowerTestPhase, QueryTemplate,
    ReadOperation, TransactionPhase, WeightedOperation, WeightedRandomPhase, WriteOperation,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// A benchmark ready to run plus the shared state it runs against.
pub struct AssembledBenchmark {
    pub benchmark: Benchmark,
    pub context: Arc<GenerationContext>,
    pub operations: OperationRegistry,
}

pub fn assemble(config: &BenchmarkConfig, storage: Arc<dyn Storage>) -> Result<AssembledBenchmark> {
    config.validate()?;

    let id_store = config
        .id_store
        .kind
        .build(config.id_store.max_id)
        .context("Failed to create id store")?;
    let phases = PhaseTopic::new();
    let document_pool = config.pools.document.unwrap_or_else(WorkerPool::default_size);
    let refill_pool = config.pools.refill.unwrap_or_else(WorkerPool::default_size);
    let context = Arc::new(
        GenerationContext::new(Arc::clone(&storage), id_store)
            .with_document_pool(WorkerPool::new("document", document_pool))
            .with_refill_pool(WorkerPool::new("refill", refill_pool))
            .with_phase_topic(phases.clone()),
    );

    for collection in &config.collections {
        register_collection(&context, collection)
            .with_context(|| format!("Failed to set up collection '{}'", collection.name))?;
    }
    info!(
        collections = config.collections.len(),
        id_store = ?config.id_store.kind,
        document_pool,
        refill_pool,
        "Generation context ready"
    );

    let mut benchmark = Benchmark::new(config.name.clone(), phases);

    if !config.indexes.is_empty() {
        benchmark =
            benchmark.with_index_phase(IndexPhase::new(Arc::clone(&storage), config.indexes.clone()));
    }

    if let Some(load) = &config.load {
        let pool_size = config.pools.load.unwrap_or_else(WorkerPool::default_size);
        let mut phase = LoadPhase::new(pool_size)?.with_timeout(Duration::from_secs(load.timeout_secs));
        for target in &load.targets {
            let writer =
                PrimaryWriteSpecification::new(Arc::clone(&context), &target.collection, target.id_offset)?;
            phase = phase.with_target(Arc::new(writer), target.count);
        }
        benchmark = benchmark.with_load_phase(phase);
    }

    let mut operations = OperationRegistry::new();
    for operation in &config.operations {
        build_operation(&mut operations, operation, &context, &storage)
            .with_context(|| format!("Failed to set up operation '{}'", operation.name()))?;
    }

    if let Some(transaction) = &config.transaction {
        let phase = match transaction {
            TransactionConfig::PowerTest { sequence, repeat } => TransactionPhase::PowerTest(
                PowerTestPhase::repeated(operations.resolve(sequence)?, *repeat),
            ),
            TransactionConfig::WeightedRandom {
                total,
                workers,
                rate_per_ms,
                mix,
            } => {
                let weighted = mix
                    .iter()
                    .map(|entry| {
                        Ok(WeightedOperation {
                            weight: entry.weight,
                            operation: operations.get(&entry.operation)?,
                        })
                    })
                    .collect::<Result<Vec<_>, docload_runner::PhaseError>>()?;
                TransactionPhase::WeightedRandom(WeightedRandomPhase::new(
                    *total,
                    *workers,
                    *rate_per_ms,
                    weighted,
                )?)
            }
        };
        benchmark = benchmark.with_transaction_phase(phase);
    }

    Ok(AssembledBenchmark {
        benchmark,
        context,
        operations,
    })
}

fn register_collection(context: &Arc<GenerationContext>, config: &CollectionConfig) -> Result<()> {
    let generator = Arc::new(FieldDocumentGenerator::new(&config.fields)?);
    let references = config
        .references
        .iter()
        .map(|edge| build_edge(context, edge))
        .collect::<Result<Vec<_>>>()?;
    let specification = match config.mode {
        CollectionMode::Persist => {
            GenerationSpecification::new(config.name.clone(), generator, references)?
        }
        CollectionMode::Compute => {
            GenerationSpecification::computed(config.name.clone(), generator, references)?
        }
    };
    context.register(specification)?;
    debug!(collection = %config.name, mode = ?config.mode, "Registered collection");
    Ok(())
}

fn build_edge(context: &Arc<GenerationContext>, edge: &ReferenceConfig) -> Result<ReferenceDistribution> {
    let count = edge.count.build()?;
    let ids = edge.ids.build()?;
    let target = edge.collection.clone();
    let documents: Arc<dyn DocumentDistribution> = match edge.selection {
        SelectionPolicy::Simple => Arc::new(SimpleDocumentDistribution::new(target, ids, context)),
        SelectionPolicy::Buffered => {
            let source = Arc::new(SimpleDocumentDistribution::new(target, ids, context));
            let buffer = edge.buffer.as_ref().map_or_else(BufferConfig::default, buffer_config);
            Arc::new(BufferedDocumentDistribution::new(source, buffer, context)?)
        }
        SelectionPolicy::Compute => Arc::new(ComputeDocumentDistribution::new(target, ids, context)?),
    };
    Ok(ReferenceDistribution::new(count, documents))
}

fn buffer_config(settings: &BufferSettings) -> BufferConfig {
    let defaults = BufferConfig::default();
    let attempts = settings.retry_attempts.unwrap_or(defaults.retry_attempts);
    let delay = settings
        .retry_delay_ms
        .map_or(defaults.retry_delay, Duration::from_millis);
    let capacity = settings.capacity.unwrap_or(defaults.capacity);
    let mut config = defaults.with_capacity(capacity).with_retry(attempts, delay);
    if let Some(low_water_mark) = settings.low_water_mark {
        config = config.with_low_water_mark(low_water_mark);
    }
    if let Some(batch_size) = settings.batch_size {
        config.batch_size = batch_size;
    }
    config
}

fn build_operation(
    registry: &mut OperationRegistry,
    config: &OperationConfig,
    context: &Arc<GenerationContext>,
    storage: &Arc<dyn Storage>,
) -> Result<()> {
    let operation: Arc<dyn docload_runner::Operation> = match config {
        OperationConfig::Write {
            name,
            collection,
            id_offset,
        } => {
            let writer = PrimaryWriteSpecification::new(Arc::clone(context), collection, *id_offset)?;
            Arc::new(WriteOperation::new(name.clone(), Arc::new(writer)))
        }
        OperationConfig::ReadById {
            name,
            collection,
            ids,
        } => Arc::new(ReadOperation::new(
            name.clone(),
            QueryTemplate::ById {
                collection: collection.clone(),
                ids: ids.build()?,
            },
            Arc::clone(storage),
        )),
        OperationConfig::ReadFieldEquals {
            name,
            collection,
            field,
            values,
            limit,
        } => {
            let values: Vec<Value> = values.iter().map(yaml_to_value).collect();
            Arc::new(ReadOperation::new(
                name.clone(),
                QueryTemplate::FieldEquals {
                    collection: collection.clone(),
                    field: field.clone(),
                    values: Arc::new(UniformChoice::new(values)?),
                    limit: *limit,
                },
                Arc::clone(storage),
            ))
        }
    };
    registry.register(operation)?;
    Ok(())
}
