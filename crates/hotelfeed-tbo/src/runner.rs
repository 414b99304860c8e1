//! Ingestion run orchestration
//!
//! Authenticate once, walk the enabled countries seeding the work pool with
//! destinations, then drain. The pool aborts on the first item failure;
//! seeding stops as soon as the abort is observed.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use anyhow::Context;
use async_trait::async_trait;

use hotelfeed_core::{ItemProcessor, RecordSink, WorkPool};

use crate::api::{AuthToken, HotelApi};
use crate::countries;
use crate::record::{WorkItem, build_record};
use crate::stats::IngestSummary;

pub struct RunOptions {
    pub workers: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            workers: hotelfeed_core::DEFAULT_WORKERS,
        }
    }
}

/// Per-item worker: fetch detail, shape the record, persist it.
struct HotelIngestor<A> {
    api: Arc<A>,
    sink: Arc<dyn RecordSink>,
    token: AuthToken,
}

#[async_trait]
impl<A: HotelApi> ItemProcessor for HotelIngestor<A> {
    type Item = WorkItem;
    type Output = ();

    async fn process(&self, item: &WorkItem) -> anyhow::Result<()> {
        let raw = self
            .api
            .hotel_detail(&item.destination_id, &self.token)
            .await
            .context("fetching hotel detail")?;
        let record = build_record(raw, item)?;
        self.sink
            .insert(&record)
            .await
            .context("persisting record")?;
        Ok(())
    }
}

/// Run a full ingestion pass over every enabled country.
pub async fn run<A: HotelApi>(
    api: Arc<A>,
    sink: Arc<dyn RecordSink>,
    options: RunOptions,
) -> anyhow::Result<IngestSummary> {
    let started = Instant::now();

    let token = api.authenticate().await.context("authentication failed")?;
    log::info!("authenticated with upstream");

    let processor = HotelIngestor {
        api: Arc::clone(&api),
        sink,
        token: token.clone(),
    };
    let failed = Arc::new(AtomicUsize::new(0));
    let failed_in_observer = Arc::clone(&failed);
    let mut pool = WorkPool::new(processor, options.workers).with_observer(Arc::new(
        move |_item: &WorkItem, _error| {
            failed_in_observer.fetch_add(1, Ordering::SeqCst);
        },
    ));

    let mut summary = IngestSummary::default();
    for country in countries::enabled() {
        // A failure in the pool makes further seeding pointless
        if pool.is_aborted() {
            log::warn!("skipping {} after abort", country.code);
            break;
        }
        let rows = api
            .destinations(&token, country.code)
            .await
            .with_context(|| format!("listing destinations for {} ({})", country.name, country.code))?;
        log::info!("{}: {} destinations", country.code, rows.len());
        summary.countries += 1;
        for destination in rows {
            let item = WorkItem {
                country_code: country.code.to_string(),
                destination_id: destination.destination_id,
            };
            if pool.enqueue(item) {
                summary.seeded += 1;
            }
        }
    }

    match pool.drain().await {
        Ok(outputs) => {
            summary.persisted = outputs.len();
            summary.failed = failed.load(Ordering::SeqCst);
            summary.elapsed = started.elapsed();
            summary.log();
            Ok(summary)
        }
        Err(e) => {
            log::error!(
                "run aborted after {} persisted items: {:#}",
                e.completed,
                e.source
            );
            Err(anyhow::Error::new(e))
        }
    }
}
