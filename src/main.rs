use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer};

mod config;
mod db;
mod pipeline;
mod scrape;
mod shutdown;

use crate::config::Config;
use crate::db::{JobFilter, JobRepository, JobStore};
use crate::pipeline::selection::{SelectionCriteria, DEFAULT_MISSING_LIMIT};
use crate::pipeline::{run_detail_scrape, RunOptions};
use crate::scrape::{HttpDetailFetcher, Platform};

#[derive(Parser)]
#[command(name = "job-scraper", about = "Job detail scraping pipeline", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape detail pages for stored jobs and record the descriptions
    Details {
        /// Explicit job ID to scrape (repeatable)
        #[arg(long = "id", value_name = "JOB_ID")]
        ids: Vec<String>,

        /// Starting internal ID of a range to scrape
        #[arg(long, requires = "end_id")]
        start_id: Option<i32>,

        /// Ending internal ID of a range to scrape
        #[arg(long, requires = "start_id")]
        end_id: Option<i32>,

        /// Number of jobs with missing descriptions to scrape
        #[arg(long)]
        quantity: Option<i64>,

        /// Also re-scrape jobs whose previous attempt failed
        #[arg(long)]
        retry_failed: bool,

        /// Persist scraped fields (omit for preview mode, which only counts)
        #[arg(long)]
        save: bool,

        /// Worker count (default: DETAIL_WORKERS from the environment)
        #[arg(long)]
        workers: Option<usize>,

        /// Job board to scrape details from
        #[arg(long, value_enum, default_value_t = Platform::JobsDb)]
        platform: Platform,
    },

    /// List stored jobs as JSON lines
    List {
        /// Match against title or description
        #[arg(long)]
        query: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        company: Option<String>,

        /// Restrict to one job board
        #[arg(long, value_enum)]
        source: Option<Platform>,

        #[arg(long, default_value_t = 100)]
        limit: i64,
    },

    /// Overwrite the description of a single job
    UpdateDescription { job_id: String, description: String },

    /// Overwrite the classification of a single job
    UpdateClass { job_id: String, job_class: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");

    // Create logs directory if it doesn't exist
    std::fs::create_dir_all(&config.log_dir).expect("Failed to create logs directory");

    init_tracing(&config.log_dir);

    info!("Starting job-scraper");
    info!("Configuration loaded successfully:");
    info!("  - Max database connections: {}", config.max_db_connections);
    info!("  - Detail workers: {}", config.num_workers);
    info!(
        "  - Request delay: {}-{} ms",
        config.scraper.min_delay.as_millis(),
        config.scraper.max_delay.as_millis()
    );

    // Get database connection pool
    let pool = db::connection::get_connection(&config.database_url, config.max_db_connections)
        .await
        .expect("Failed to connect to database");

    info!("Database connection pool established");

    // Run migrations on startup
    db::migrations::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let repository = JobRepository::new(pool);

    match cli.command {
        Command::Details {
            ids,
            start_id,
            end_id,
            quantity,
            retry_failed,
            save,
            workers,
            platform,
        } => {
            let criterion = resolve_criterion(ids, start_id, end_id, quantity, retry_failed);
            let options = RunOptions {
                save,
                workers: workers.unwrap_or(config.num_workers),
                min_delay: config.scraper.min_delay,
                max_delay: config.scraper.max_delay,
            };

            let (shutdown_tx, shutdown_rx) = shutdown::channel();
            shutdown::spawn_signal_listener(shutdown_tx.clone());
            if let Some(deadline) = config.scraper.run_deadline {
                shutdown::spawn_deadline(shutdown_tx.clone(), deadline);
            }

            let scraper_config = config.scraper.clone();
            let store = Arc::new(repository);

            let result = run_detail_scrape(
                store,
                |_worker_id| HttpDetailFetcher::new(platform, &scraper_config),
                &criterion,
                &options,
                shutdown_rx,
            )
            .await;

            match result {
                Ok(summary) => {
                    println!(
                        "{}",
                        serde_json::to_string(&summary).expect("Failed to serialize run summary")
                    );
                }
                Err(e) => {
                    error!("Detail scrape aborted: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Command::List {
            query,
            location,
            company,
            source,
            limit,
        } => {
            let filter = JobFilter {
                query,
                location,
                company,
                source: source.map(|platform| platform.source_name().to_string()),
                limit,
            };

            match repository.list_jobs(&filter).await {
                Ok(rows) => {
                    for row in rows {
                        println!(
                            "{}",
                            serde_json::to_string(&row).expect("Failed to serialize job row")
                        );
                    }
                }
                Err(e) => {
                    error!("Failed to list jobs: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Command::UpdateDescription {
            job_id,
            description,
        } => {
            report_update(
                repository.update_description(&job_id, &description).await,
                "description",
                &job_id,
            );
        }

        Command::UpdateClass { job_id, job_class } => {
            report_update(
                repository.update_class(&job_id, &job_class).await,
                "job class",
                &job_id,
            );
        }
    }
}

/// Map the detail-scrape flags onto a selection criterion, falling back to
/// the default "most recent missing" query when nothing is given
fn resolve_criterion(
    ids: Vec<String>,
    start_id: Option<i32>,
    end_id: Option<i32>,
    quantity: Option<i64>,
    retry_failed: bool,
) -> SelectionCriteria {
    if !ids.is_empty() {
        SelectionCriteria::ExplicitIds(ids)
    } else if let (Some(start), Some(end)) = (start_id, end_id) {
        SelectionCriteria::InternalIdRange { start, end }
    } else {
        SelectionCriteria::MissingDescription {
            limit: quantity.unwrap_or(DEFAULT_MISSING_LIMIT),
            retry_attempted: retry_failed,
        }
    }
}

/// Report the result of a single-record update command
fn report_update(result: Result<bool, sqlx::Error>, field: &str, job_id: &str) {
    match result {
        Ok(true) => info!("Successfully updated {} for job ID: {}", field, job_id),
        Ok(false) => {
            error!("Job with ID {} not found", job_id);
            std::process::exit(1);
        }
        Err(e) => {
            error!("Failed to update {} for job ID {}: {}", field, job_id, e);
            std::process::exit(1);
        }
    }
}

/// Initialize file-based logging with daily rotation and level separation
/// plus console output. Log files are created as logs/info.YYYY-MM-DD.log
/// and logs/error.YYYY-MM-DD.log.
fn init_tracing(log_dir: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    let info_file = tracing_appender::rolling::daily(log_dir, "info.log");
    let error_file = tracing_appender::rolling::daily(log_dir, "error.log");

    let info_layer = tracing_subscriber::fmt::layer()
        .with_writer(info_file)
        .with_ansi(false)
        .with_filter(LevelFilter::INFO);

    let error_layer = tracing_subscriber::fmt::layer()
        .with_writer(error_file)
        .with_ansi(false)
        .with_filter(LevelFilter::ERROR);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(info_layer)
        .with(error_layer)
        .init();
}
