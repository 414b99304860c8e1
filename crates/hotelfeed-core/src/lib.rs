//! hotelfeed core - shared infrastructure for the ingestion job
//!
//! This crate provides the source-agnostic pieces: retry-wrapped upstream
//! requests, the bounded-concurrency work pool, and the record sink
//! boundary.

pub mod error;
pub mod logging;
pub mod pipeline;
pub mod retry;
pub mod sink;

// Re-exports for convenience
pub use error::FetchError;
pub use logging::init_logging;
pub use pipeline::{DEFAULT_WORKERS, FailureObserver, ItemProcessor, PipelineError, WorkPool};
pub use retry::{Backoff, RetryPolicy, execute};
pub use sink::{MemorySink, RecordSink};
