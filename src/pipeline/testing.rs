//! In-memory mock collaborators shared by the pipeline tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::db::JobStore;
use crate::scrape::{DetailFetcher, FetchError, JobDetail};

/// In-memory job store recording every write
#[derive(Default)]
pub(crate) struct MockStore {
    /// IDs returned by both selection queries
    selectable: Vec<String>,
    /// IDs for which updates report "not found"
    unknown_ids: HashSet<String>,
    /// When set, every store call fails
    fail_all: bool,
    /// (column, job_id, value) triples in call order
    writes: Mutex<Vec<(String, String, String)>>,
}

impl MockStore {
    pub fn with_selectable(ids: Vec<&str>) -> Self {
        Self {
            selectable: ids.into_iter().map(String::from).collect(),
            ..Self::default()
        }
    }

    pub fn with_unknown(ids: Vec<&str>) -> Self {
        Self {
            unknown_ids: ids.into_iter().map(String::from).collect(),
            ..Self::default()
        }
    }

    pub fn failing_selection() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    pub fn failing_writes() -> Self {
        Self::failing_selection()
    }

    pub fn writes(&self) -> Vec<(String, String, String)> {
        self.writes.lock().unwrap().clone()
    }

    fn record(&self, column: &str, job_id: &str, value: &str) -> Result<bool, sqlx::Error> {
        if self.fail_all {
            return Err(sqlx::Error::RowNotFound);
        }
        if self.unknown_ids.contains(job_id) {
            return Ok(false);
        }
        self.writes.lock().unwrap().push((
            column.to_string(),
            job_id.to_string(),
            value.to_string(),
        ));
        Ok(true)
    }
}

#[async_trait]
impl JobStore for MockStore {
    async fn job_ids_by_internal_range(
        &self,
        _start: i32,
        _end: i32,
    ) -> Result<Vec<String>, sqlx::Error> {
        if self.fail_all {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(self.selectable.clone())
    }

    async fn job_ids_missing_description(
        &self,
        limit: i64,
        _retry_attempted: bool,
    ) -> Result<Vec<String>, sqlx::Error> {
        if self.fail_all {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(self.selectable.iter().take(limit as usize).cloned().collect())
    }

    async fn update_description(
        &self,
        job_id: &str,
        description: &str,
    ) -> Result<bool, sqlx::Error> {
        self.record("description", job_id, description)
    }

    async fn update_title(&self, job_id: &str, title: &str) -> Result<bool, sqlx::Error> {
        self.record("name", job_id, title)
    }

    async fn update_company(
        &self,
        job_id: &str,
        company_name: &str,
    ) -> Result<bool, sqlx::Error> {
        self.record("company_name", job_id, company_name)
    }

    async fn update_class(&self, job_id: &str, job_class: &str) -> Result<bool, sqlx::Error> {
        self.record("job_class", job_id, job_class)
    }
}

/// Scripted behavior for one job ID
pub(crate) enum FetchScript {
    /// Page yields a description only
    Description(&'static str),
    /// Page yields description plus title and company
    Full {
        description: &'static str,
        title: &'static str,
        company: &'static str,
    },
    /// Page fetched but no description found
    NotFound,
    /// Fetch fails with an HTTP status error
    Fail,
}

/// Scripted detail fetcher; unknown IDs behave like `NotFound`
#[derive(Default)]
pub(crate) struct MockFetcher {
    scripts: HashMap<String, FetchScript>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new(scripts: Vec<(&str, FetchScript)>) -> Self {
        Self {
            scripts: scripts
                .into_iter()
                .map(|(id, script)| (id.to_string(), script))
                .collect(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle to the call log, usable after the fetcher has been moved
    /// into a worker
    pub fn call_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl DetailFetcher for MockFetcher {
    async fn fetch_detail(&self, job_id: &str) -> Result<Option<JobDetail>, FetchError> {
        self.calls.lock().unwrap().push(job_id.to_string());

        match self.scripts.get(job_id) {
            Some(FetchScript::Description(description)) => Ok(Some(JobDetail {
                description: description.to_string(),
                title: None,
                company: None,
            })),
            Some(FetchScript::Full {
                description,
                title,
                company,
            }) => Ok(Some(JobDetail {
                description: description.to_string(),
                title: Some(title.to_string()),
                company: Some(company.to_string()),
            })),
            Some(FetchScript::Fail) => Err(FetchError::Status(reqwest::StatusCode::FORBIDDEN)),
            Some(FetchScript::NotFound) | None => Ok(None),
        }
    }
}
