//! Run summary

use std::time::Duration;

/// Counters for one ingestion run.
#[derive(Debug, Default, Clone)]
pub struct IngestSummary {
    /// Countries whose destination lists were fetched
    pub countries: usize,
    /// Work items enqueued across all countries
    pub seeded: usize,
    /// Records written to the sink
    pub persisted: usize,
    /// Items that failed or were cancelled by the abort
    pub failed: usize,
    pub elapsed: Duration,
}

impl IngestSummary {
    pub fn log(&self) {
        log::info!(
            "ingestion complete: {} countries, {} destinations seeded, {} persisted, {} failed in {:.1}s",
            self.countries,
            self.seeded,
            self.persisted,
            self.failed,
            self.elapsed.as_secs_f64()
        );
    }
}
