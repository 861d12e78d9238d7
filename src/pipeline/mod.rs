pub mod batch;
pub mod selection;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

use futures_util::future::join_all;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::db::JobStore;
use crate::scrape::{DetailFetcher, FetchError};
use batch::split_into_batches;
use selection::{select_job_ids, SelectionCriteria};
use worker::{BatchTally, BatchWorker};

/// Aggregate result of one pipeline run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub success_count: usize,
    pub failure_count: usize,
}

/// Per-run settings passed down to every worker
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Persist results; when false the run only counts (preview mode)
    pub save: bool,
    /// Requested worker count; capped at the number of selected jobs
    pub workers: usize,
    /// Lower bound of the randomized pre-request delay
    pub min_delay: Duration,
    /// Upper bound of the randomized pre-request delay
    pub max_delay: Duration,
}

/// Errors that abort a run before any worker starts
#[derive(Debug)]
pub enum RunError {
    /// The selection query against the store failed
    Selection(sqlx::Error),
    /// A worker's fetcher could not be constructed
    FetcherSetup(FetchError),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Selection(e) => write!(f, "Selection query failed: {}", e),
            RunError::FetcherSetup(e) => write!(f, "Fetcher construction failed: {}", e),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Selection(e) => Some(e),
            RunError::FetcherSetup(e) => Some(e),
        }
    }
}

/// Run the detail-scraping pipeline end to end.
///
/// Resolves the criterion into job IDs, splits them into contiguous
/// per-worker batches, processes every batch on its own task, then joins
/// them all and sums the tallies. Per-job failures are recorded in the
/// tallies and never abort the run; the summary always reflects every
/// selected job. `make_fetcher` is called once per worker so each worker
/// owns an independent fetcher instance.
pub async fn run_detail_scrape<S, F, M>(
    store: Arc<S>,
    mut make_fetcher: M,
    criterion: &SelectionCriteria,
    options: &RunOptions,
    shutdown: watch::Receiver<bool>,
) -> Result<RunSummary, RunError>
where
    S: JobStore + 'static,
    F: DetailFetcher + 'static,
    M: FnMut(usize) -> Result<F, FetchError>,
{
    let job_ids = select_job_ids(store.as_ref(), criterion)
        .await
        .map_err(RunError::Selection)?;

    if job_ids.is_empty() {
        warn!("No job IDs found matching the criteria to scrape details for");
        return Ok(RunSummary::default());
    }

    let batches = split_into_batches(&job_ids, options.workers);
    let total_workers = batches.len();

    info!(
        "Starting detail scraping with {} workers. Each worker will process ~{} jobs",
        total_workers,
        batches[0].len()
    );
    info!("Total jobs: {}, save mode: {}", job_ids.len(), options.save);

    let mut handles = Vec::with_capacity(total_workers);
    let mut batch_sizes = Vec::with_capacity(total_workers);

    for (idx, batch) in batches.into_iter().enumerate() {
        let worker_id = idx + 1;
        let fetcher = make_fetcher(worker_id).map_err(RunError::FetcherSetup)?;
        let batch_worker =
            BatchWorker::new(worker_id, total_workers, Arc::clone(&store), fetcher, options);

        batch_sizes.push(batch.len());
        handles.push(tokio::spawn(
            batch_worker.process_batch(batch, shutdown.clone()),
        ));
    }

    let mut summary = RunSummary::default();
    for (idx, joined) in join_all(handles).await.into_iter().enumerate() {
        match joined {
            Ok(BatchTally { success, failure }) => {
                summary.success_count += success;
                summary.failure_count += failure;
            }
            Err(e) => {
                // Workers fold their own failures into the tally; only a
                // panicked task lands here. Count its whole batch as failed.
                error!("Worker {} task failed: {:?}", idx + 1, e);
                summary.failure_count += batch_sizes[idx];
            }
        }
    }

    info!(
        "All workers completed. Total processed: {}",
        summary.success_count + summary.failure_count
    );
    info!(
        "Final stats -> Success: {}, Failure: {}",
        summary.success_count, summary.failure_count
    );
    Ok(summary)
}
