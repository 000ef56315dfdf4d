use super::DocumentDistribution;
use crate::context::{upgrade, GenerationContext};
use crate::error::GenerationError;
use crate::task::{DocumentTask, TaskKind};
use async_trait::async_trait;
use docload_core::{CollectionName, IdLong};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;
use tracing::{debug, warn};

/// Sizing and retry policy of a [`BufferedDocumentDistribution`].
#[derive(Debug, Clone)]
pub struct BufferConfig {
    /// Upper bound on queued plus in-flight ids.
    pub capacity: usize,
    /// Refill starts when queued plus in-flight ids drop below this.
    pub low_water_mark: usize,
    /// Candidates drawn per refill round.
    pub batch_size: usize,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            low_water_mark: 1000,
            batch_size: 50,
            retry_attempts: 10,
            retry_delay: Duration::from_millis(100),
        }
    }
}

impl BufferConfig {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self.low_water_mark = self.low_water_mark.min(capacity);
        self
    }

    pub fn with_low_water_mark(mut self, low_water_mark: usize) -> Self {
        self.low_water_mark = low_water_mark;
        self
    }

    pub fn with_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.retry_attempts = attempts;
        self.retry_delay = delay;
        self
    }
}

/// Hands out read tasks for ids already persisted.
///
/// Candidates come from a source distribution. Read candidates are queued
/// directly; write candidates are executed on the refill pool and queued
/// once persisted. An id is therefore only ever returned after
/// `exists` became true for it.
pub struct BufferedDocumentDistribution {
    inner: Arc<Buffer>,
}

struct Buffer {
    collection: CollectionName,
    source: Arc<dyn DocumentDistribution>,
    config: BufferConfig,
    context: Weak<GenerationContext>,
    queue: Mutex<VecDeque<IdLong>>,
    in_flight: AtomicUsize,
    drawing: AtomicBool,
}

impl BufferedDocumentDistribution {
    pub fn new(
        source: Arc<dyn DocumentDistribution>,
        config: BufferConfig,
        context: &Arc<GenerationContext>,
    ) -> Result<Self, GenerationError> {
        let collection = source.collection().clone();
        if !source.produces_persisted() {
            return Err(GenerationError::Config(format!(
                "buffered references to '{collection}' need a source that persists documents"
            )));
        }
        if config.capacity == 0 || config.batch_size == 0 {
            return Err(GenerationError::Config(format!(
                "buffer for '{collection}' needs a positive capacity and batch size"
            )));
        }
        Ok(Self {
            inner: Arc::new(Buffer {
                collection,
                source,
                config,
                context: Arc::downgrade(context),
                queue: Mutex::new(VecDeque::new()),
                in_flight: AtomicUsize::new(0),
                drawing: AtomicBool::new(false),
            }),
        })
    }

    /// Ids currently queued.
    pub fn queued(&self) -> usize {
        self.inner.queue_len()
    }
}

impl Buffer {
    fn queue_len(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn push(&self, id: IdLong) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(id);
    }

    fn pop(&self) -> Option<IdLong> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    /// Start a refill round if the buffer is below its low-water mark.
    fn maybe_refill(self: &Arc<Self>, context: &Arc<GenerationContext>) {
        if context.phases().has_ended() {
            return;
        }
        let level = self.queue_len() + self.in_flight.load(Ordering::Acquire);
        if level >= self.config.low_water_mark {
            return;
        }
        if self.drawing.swap(true, Ordering::AcqRel) {
            return;
        }
        let wanted = self
            .config
            .capacity
            .saturating_sub(level)
            .min(self.config.batch_size);
        let buffer = Arc::clone(self);
        let context = Arc::clone(context);
        tokio::spawn(async move {
            buffer.refill(&context, wanted).await;
            buffer.drawing.store(false, Ordering::Release);
        });
    }

    async fn refill(self: &Arc<Self>, context: &Arc<GenerationContext>, wanted: usize) {
        let mut rng = StdRng::from_entropy();
        let mut queued = 0usize;
        let mut writes = 0usize;
        for _ in 0..wanted {
            let mut task = match self.source.next(&mut rng).await {
                Ok(task) => task,
                Err(e) => {
                    warn!(collection = %self.collection, error = %e, "Failed to draw buffer candidate");
                    break;
                }
            };
            match task.kind() {
                TaskKind::Read => {
                    self.push(task.id());
                    queued += 1;
                }
                _ => {
                    self.in_flight.fetch_add(1, Ordering::AcqRel);
                    writes += 1;
                    let buffer = Arc::clone(self);
                    context.refill_pool().spawn(async move {
                        let id = task.id();
                        match task.execute().await {
                            Ok(_) => buffer.push(id),
                            Err(e) => warn!(
                                collection = %buffer.collection,
                                id = id.value(),
                                error = %e,
                                "Buffer refill write failed"
                            ),
                        }
                        buffer.in_flight.fetch_sub(1, Ordering::AcqRel);
                    });
                }
            }
        }
        debug!(
            collection = %self.collection,
            queued,
            writes,
            "Buffer refill round finished"
        );
    }
}

#[async_trait]
impl DocumentDistribution for BufferedDocumentDistribution {
    fn collection(&self) -> &CollectionName {
        &self.inner.collection
    }

    async fn next(&self, _rng: &mut StdRng) -> Result<DocumentTask, GenerationError> {
        let context = upgrade(&self.inner.context)?;
        let attempts = self.inner.config.retry_attempts;
        for attempt in 0..=attempts {
            self.inner.maybe_refill(&context);
            if let Some(id) = self.inner.pop() {
                self.inner.maybe_refill(&context);
                return Ok(DocumentTask::new(
                    TaskKind::Read,
                    self.inner.collection.clone(),
                    id,
                    context,
                ));
            }
            if attempt < attempts {
                tokio::time::sleep(self.inner.config.retry_delay).await;
            }
        }
        Err(GenerationError::BufferExhausted {
            collection: self.inner.collection.clone(),
            attempts,
        })
    }

    fn is_repeatable(&self) -> bool {
        false
    }
}
