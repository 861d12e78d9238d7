use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::db::models::{EMPTY_SENTINEL, ERROR_SENTINEL_PREFIX};
use crate::db::JobStore;
use crate::pipeline::RunOptions;
use crate::scrape::{DetailFetcher, JobDetail};

/// Log progress on the first, last and every Nth job of a batch
const PROGRESS_INTERVAL: usize = 50;

/// Outcome of one detail-scrape step. Every failure mode is folded into a
/// variant here; the batch loop never sees an error value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// A usable description was found (and persisted in save mode)
    Success,
    /// The page yielded no description, or only the placeholder text
    Empty,
    /// The fetch or the result recording failed; the label names the class
    Failed(&'static str),
}

/// Success/failure tally for one batch
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchTally {
    pub success: usize,
    pub failure: usize,
}

/// Processes one batch of job IDs sequentially. Owns its fetcher and store
/// handle for the duration of the run; nothing is shared with other workers.
pub struct BatchWorker<S, F> {
    worker_id: usize,
    total_workers: usize,
    store: Arc<S>,
    fetcher: F,
    save: bool,
    min_delay: Duration,
    max_delay: Duration,
}

impl<S, F> BatchWorker<S, F>
where
    S: JobStore,
    F: DetailFetcher,
{
    pub fn new(
        worker_id: usize,
        total_workers: usize,
        store: Arc<S>,
        fetcher: F,
        options: &RunOptions,
    ) -> Self {
        Self {
            worker_id,
            total_workers,
            store,
            fetcher,
            save: options.save,
            min_delay: options.min_delay,
            max_delay: options.max_delay,
        }
    }

    /// Process every job in the batch in order and return the tally.
    ///
    /// Per-job failures are counted, never propagated; this function cannot
    /// fail. A shutdown signal stops the worker between jobs; unprocessed
    /// jobs stay selectable for the next run.
    pub async fn process_batch(
        self,
        batch: Vec<String>,
        shutdown: watch::Receiver<bool>,
    ) -> BatchTally {
        let total = batch.len();
        info!(
            "[Worker-{}/{}] Starting batch processing of {} jobs",
            self.worker_id, self.total_workers, total
        );

        let mut tally = BatchTally::default();

        for (idx, job_id) in batch.iter().enumerate() {
            let stop_requested = *shutdown.borrow();
            if stop_requested {
                warn!(
                    "[Worker-{}/{}] Shutdown requested, leaving {} of {} jobs unprocessed",
                    self.worker_id,
                    self.total_workers,
                    total - idx,
                    total
                );
                break;
            }

            // Randomized delay before each request to avoid rate limiting
            self.pause_before_request().await;

            if idx == 0 || idx == total - 1 || (idx + 1) % PROGRESS_INTERVAL == 0 {
                info!(
                    "[Worker-{}/{}] Processing job {}/{}: {} (success: {}, failure: {})",
                    self.worker_id,
                    self.total_workers,
                    idx + 1,
                    total,
                    job_id,
                    tally.success,
                    tally.failure
                );
            }

            match self.scrape_one(job_id).await {
                JobOutcome::Success => tally.success += 1,
                outcome => {
                    debug!(
                        "[Worker-{}/{}] Job {} counted as failure: {:?}",
                        self.worker_id, self.total_workers, job_id, outcome
                    );
                    tally.failure += 1;
                }
            }
        }

        info!(
            "[Worker-{}/{}] Completed batch. Success: {}, Failure: {}",
            self.worker_id, self.total_workers, tally.success, tally.failure
        );
        tally
    }

    async fn pause_before_request(&self) {
        let delay_ms = {
            let mut rng = rand::thread_rng();
            rng.gen_range(self.min_delay.as_millis() as u64..=self.max_delay.as_millis() as u64)
        };
        if delay_ms > 0 {
            debug!(
                "[Worker-{}/{}] Sleeping for {} ms",
                self.worker_id, self.total_workers, delay_ms
            );
            sleep(Duration::from_millis(delay_ms)).await;
        }
    }

    /// Fetch, classify and optionally persist one job
    async fn scrape_one(&self, job_id: &str) -> JobOutcome {
        match self.fetcher.fetch_detail(job_id).await {
            Ok(Some(detail)) if has_usable_description(&detail) => {
                if self.save {
                    self.persist_detail(job_id, &detail).await
                } else {
                    debug!(
                        "[Worker-{}/{}] Job {} description found (preview mode)",
                        self.worker_id, self.total_workers, job_id
                    );
                    JobOutcome::Success
                }
            }
            Ok(_) => {
                warn!(
                    "[Worker-{}/{}] Job {} no valid description found",
                    self.worker_id, self.total_workers, job_id
                );
                if self.save {
                    self.mark_attempted(job_id, EMPTY_SENTINEL).await;
                }
                JobOutcome::Empty
            }
            Err(e) => {
                error!(
                    "[Worker-{}/{}] Job {} failed: {}",
                    self.worker_id, self.total_workers, job_id, e
                );
                let kind = e.kind();
                if self.save {
                    let marker = format!("{} {}", ERROR_SENTINEL_PREFIX, kind);
                    self.mark_attempted(job_id, &marker).await;
                }
                JobOutcome::Failed(kind)
            }
        }
    }

    /// Write the scraped fields. The description write alone decides the
    /// outcome; title/company are best-effort extras.
    async fn persist_detail(&self, job_id: &str, detail: &JobDetail) -> JobOutcome {
        match self.store.update_description(job_id, &detail.description).await {
            Ok(true) => {
                self.persist_extras(job_id, detail).await;
                JobOutcome::Success
            }
            Ok(false) => {
                warn!(
                    "[Worker-{}/{}] Job {} not found in store",
                    self.worker_id, self.total_workers, job_id
                );
                JobOutcome::Failed("NotFound")
            }
            Err(e) => {
                error!(
                    "[Worker-{}/{}] Job {} description write failed: {}",
                    self.worker_id, self.total_workers, job_id, e
                );
                JobOutcome::Failed("Store")
            }
        }
    }

    async fn persist_extras(&self, job_id: &str, detail: &JobDetail) {
        if let Some(title) = &detail.title {
            if let Err(e) = self.store.update_title(job_id, title).await {
                warn!(
                    "[Worker-{}/{}] Job {} title write failed: {}",
                    self.worker_id, self.total_workers, job_id, e
                );
            }
        }
        if let Some(company) = &detail.company {
            if let Err(e) = self.store.update_company(job_id, company).await {
                warn!(
                    "[Worker-{}/{}] Job {} company write failed: {}",
                    self.worker_id, self.total_workers, job_id, e
                );
            }
        }
    }

    /// Record a sentinel so the job counts as attempted. Failures here are
    /// logged and swallowed; they must never take down the batch.
    async fn mark_attempted(&self, job_id: &str, marker: &str) {
        match self.store.update_description(job_id, marker).await {
            Ok(true) => {}
            Ok(false) => debug!(
                "[Worker-{}/{}] Job {} not found while marking attempt",
                self.worker_id, self.total_workers, job_id
            ),
            Err(e) => warn!(
                "[Worker-{}/{}] Job {} attempt marker write failed: {}",
                self.worker_id, self.total_workers, job_id, e
            ),
        }
    }
}

/// True when the description is worth persisting as a scrape success
fn has_usable_description(detail: &JobDetail) -> bool {
    !detail.description.is_empty() && detail.description != EMPTY_SENTINEL
}
