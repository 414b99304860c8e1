//! Bounded-concurrency ingestion pipeline
//!
//! A producer enqueues work items while a capped number of workers
//! processes them. The first item failure aborts the batch: items that have
//! not started yet are cancelled, in-flight items run to completion
//! uninterrupted, and further enqueues are refused so the producer stops
//! seeding. `drain` waits for every queued item to reach a terminal state
//! before reporting.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Concurrently processed items unless overridden
pub const DEFAULT_WORKERS: usize = 10;

/// Processes one work item end to end (fetch, transform, persist).
#[async_trait]
pub trait ItemProcessor: Send + Sync + 'static {
    type Item: fmt::Display + fmt::Debug + Send + Sync + 'static;
    type Output: Send + 'static;

    async fn process(&self, item: &Self::Item) -> anyhow::Result<Self::Output>;
}

/// Diagnostic hook invoked once per failed item.
pub type FailureObserver<T> = Arc<dyn Fn(&T, &anyhow::Error) + Send + Sync>;

/// First failure of an aborted batch.
#[derive(Debug)]
pub struct PipelineError<T> {
    pub item: T,
    pub source: anyhow::Error,
    /// Items that completed before the abort took effect
    pub completed: usize,
}

impl<T: fmt::Display> fmt::Display for PipelineError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "processing failed for {}", self.item)
    }
}

impl<T: fmt::Display + fmt::Debug> std::error::Error for PipelineError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

enum TaskOutcome<T, O> {
    Done(O),
    Failed { item: T, error: anyhow::Error },
    /// Cancelled before the item started; not a failure of the item itself
    Aborted,
}

/// Work pool with a hard cap on in-flight items.
///
/// Queued items wait for a semaphore permit; the queue itself is unbounded.
/// Outputs accumulate in completion order, not submission order.
pub struct WorkPool<P: ItemProcessor> {
    processor: Arc<P>,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
    observer: Option<FailureObserver<P::Item>>,
    tasks: JoinSet<TaskOutcome<P::Item, P::Output>>,
}

impl<P: ItemProcessor> WorkPool<P> {
    pub fn new(processor: P, workers: usize) -> Self {
        Self {
            processor: Arc::new(processor),
            permits: Arc::new(Semaphore::new(workers.max(1))),
            cancel: CancellationToken::new(),
            observer: None,
            tasks: JoinSet::new(),
        }
    }

    /// Register a diagnostic callback fired for every failed item.
    pub fn with_observer(mut self, observer: FailureObserver<P::Item>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Whether the fail-fast abort has been triggered.
    pub fn is_aborted(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Queue an item for processing. Returns false (dropping the item) once
    /// the pool has aborted.
    pub fn enqueue(&mut self, item: P::Item) -> bool {
        if self.cancel.is_cancelled() {
            log::debug!("pool aborted, dropping {item}");
            return false;
        }
        let processor = Arc::clone(&self.processor);
        let permits = Arc::clone(&self.permits);
        let cancel = self.cancel.clone();
        let observer = self.observer.clone();
        self.tasks.spawn(async move {
            let _permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => return TaskOutcome::Aborted,
                permit = Arc::clone(&permits).acquire_owned() => {
                    permit.expect("semaphore never closed")
                }
            };
            // The abort may have landed while this task held no permit yet
            if cancel.is_cancelled() {
                return TaskOutcome::Aborted;
            }
            match processor.process(&item).await {
                Ok(output) => TaskOutcome::Done(output),
                Err(error) => {
                    log::error!("error processing {item}: {error:#}");
                    if let Some(observer) = &observer {
                        observer(&item, &error);
                    }
                    cancel.cancel();
                    TaskOutcome::Failed { item, error }
                }
            }
        });
        true
    }

    /// Wait until every queued item reached a terminal state.
    ///
    /// On abort, returns the first real failure; synthetic aborts of items
    /// that never started are not reported as errors.
    pub async fn drain(&mut self) -> Result<Vec<P::Output>, PipelineError<P::Item>> {
        let mut outputs = Vec::new();
        let mut failure: Option<(P::Item, anyhow::Error)> = None;
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(TaskOutcome::Done(output)) => outputs.push(output),
                Ok(TaskOutcome::Failed { item, error }) => {
                    if failure.is_none() {
                        failure = Some((item, error));
                    }
                }
                Ok(TaskOutcome::Aborted) => {}
                Err(join_error) => {
                    if join_error.is_panic() {
                        std::panic::resume_unwind(join_error.into_panic());
                    }
                }
            }
        }
        match failure {
            Some((item, source)) => Err(PipelineError {
                item,
                source,
                completed: outputs.len(),
            }),
            None => Ok(outputs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Tracks the number of concurrently running items and which items ran.
    struct Recorder {
        running: AtomicUsize,
        high_water: AtomicUsize,
        processed: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl Recorder {
        fn new(fail_on: Option<&'static str>) -> Self {
            Self {
                running: AtomicUsize::new(0),
                high_water: AtomicUsize::new(0),
                processed: Mutex::new(Vec::new()),
                fail_on,
            }
        }
    }

    struct SleepProcessor(Arc<Recorder>);

    #[async_trait]
    impl ItemProcessor for SleepProcessor {
        type Item = String;
        type Output = String;

        async fn process(&self, item: &String) -> anyhow::Result<String> {
            let now = self.0.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.0.high_water.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.0.running.fetch_sub(1, Ordering::SeqCst);
            self.0.processed.lock().unwrap().push(item.clone());
            if self.0.fail_on == Some(item.as_str()) {
                anyhow::bail!("simulated failure");
            }
            Ok(item.clone())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_never_exceeds_cap() {
        let recorder = Arc::new(Recorder::new(None));
        let mut pool = WorkPool::new(SleepProcessor(Arc::clone(&recorder)), 3);
        for i in 0..10 {
            assert!(pool.enqueue(format!("item-{i}")));
        }
        let outputs = pool.drain().await.unwrap();

        assert_eq!(outputs.len(), 10);
        assert_eq!(recorder.high_water.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn clean_drain_collects_everything() {
        let recorder = Arc::new(Recorder::new(None));
        let mut pool = WorkPool::new(SleepProcessor(Arc::clone(&recorder)), 2);
        for i in 0..5 {
            pool.enqueue(format!("item-{i}"));
        }
        let outputs = pool.drain().await.unwrap();
        assert_eq!(outputs.len(), 5);
        assert!(!pool.is_aborted());
    }

    #[tokio::test(start_paused = true)]
    async fn first_failure_aborts_pending_items() {
        let recorder = Arc::new(Recorder::new(Some("item-3")));
        let observed: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let observed_in_cb = Arc::clone(&observed);

        // Single worker: items run strictly in submission order
        let mut pool = WorkPool::new(SleepProcessor(Arc::clone(&recorder)), 1)
            .with_observer(Arc::new(move |item: &String, _error| {
                observed_in_cb.lock().unwrap().push(item.clone());
            }));
        for i in 1..=5 {
            pool.enqueue(format!("item-{i}"));
        }

        let err = pool.drain().await.unwrap_err();
        assert_eq!(err.item, "item-3");
        assert_eq!(err.completed, 2);

        // Observer saw exactly the failing item
        assert_eq!(*observed.lock().unwrap(), vec!["item-3".to_string()]);

        // Items 4 and 5 never started
        let processed = recorder.processed.lock().unwrap().clone();
        assert_eq!(processed, vec!["item-1", "item-2", "item-3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn enqueue_refused_after_abort() {
        let recorder = Arc::new(Recorder::new(Some("item-1")));
        let mut pool = WorkPool::new(SleepProcessor(recorder), 1);
        pool.enqueue("item-1".to_string());
        let _ = pool.drain().await;

        assert!(pool.is_aborted());
        assert!(!pool.enqueue("late".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn producer_can_enqueue_while_draining_workers_run() {
        let recorder = Arc::new(Recorder::new(None));
        let mut pool = WorkPool::new(SleepProcessor(Arc::clone(&recorder)), 2);
        pool.enqueue("early".to_string());
        tokio::task::yield_now().await;
        pool.enqueue("late".to_string());

        let outputs = pool.drain().await.unwrap();
        assert_eq!(outputs.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn pipeline_error_display_names_the_item() {
        let recorder = Arc::new(Recorder::new(Some("item-1")));
        let mut pool = WorkPool::new(SleepProcessor(recorder), 1);
        pool.enqueue("item-1".to_string());
        let err = pool.drain().await.unwrap_err();
        assert_eq!(format!("{err}"), "processing failed for item-1");
    }
}
