use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use tracing::debug;

use crate::db::models::{EMPTY_SENTINEL, ERROR_SENTINEL_PREFIX, JobRow};

/// Store operations the detail pipeline depends on (trait to allow mocking)
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Job IDs whose surrogate key falls in `start..=end`
    async fn job_ids_by_internal_range(
        &self,
        start: i32,
        end: i32,
    ) -> Result<Vec<String>, sqlx::Error>;

    /// Up to `limit` job IDs still lacking a usable description, newest
    /// first. With `retry_attempted`, rows marked with a failure sentinel
    /// are selected again.
    async fn job_ids_missing_description(
        &self,
        limit: i64,
        retry_attempted: bool,
    ) -> Result<Vec<String>, sqlx::Error>;

    /// Update the description of a job. Returns false when no row matches
    /// `job_id`.
    async fn update_description(
        &self,
        job_id: &str,
        description: &str,
    ) -> Result<bool, sqlx::Error>;

    /// Update the title of a job. Same contract as `update_description`.
    async fn update_title(&self, job_id: &str, title: &str) -> Result<bool, sqlx::Error>;

    /// Update the company name of a job. Same contract as `update_description`.
    async fn update_company(&self, job_id: &str, company_name: &str)
        -> Result<bool, sqlx::Error>;

    /// Update the classification of a job. Same contract as `update_description`.
    async fn update_class(&self, job_id: &str, job_class: &str) -> Result<bool, sqlx::Error>;
}

/// Optional filters for listing stored jobs
#[derive(Debug, Default, Clone)]
pub struct JobFilter {
    /// Matches against title or description
    pub query: Option<String>,
    pub location: Option<String>,
    pub company: Option<String>,
    /// Source platform label, e.g. "JobsDB"
    pub source: Option<String>,
    pub limit: i64,
}

/// Repository for job table operations, one pooled connection per query
#[derive(Clone)]
pub struct JobRepository {
    pool: Pool<Postgres>,
}

impl JobRepository {
    /// Create a new JobRepository instance
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List stored jobs matching the filter, most recently scraped first
    ///
    /// Builds the WHERE clause dynamically from the filters that are set,
    /// binding each value in order.
    pub async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<JobRow>, sqlx::Error> {
        let mut clauses = Vec::new();
        let mut values = Vec::new();

        if let Some(query) = &filter.query {
            values.push(format!("%{}%", query));
            let n = values.len();
            clauses.push(format!("(name ILIKE ${} OR description ILIKE ${})", n, n));
        }
        if let Some(location) = &filter.location {
            values.push(format!("%{}%", location));
            clauses.push(format!("location ILIKE ${}", values.len()));
        }
        if let Some(company) = &filter.company {
            values.push(format!("%{}%", company));
            clauses.push(format!("company_name ILIKE ${}", values.len()));
        }
        if let Some(source) = &filter.source {
            values.push(source.clone());
            clauses.push(format!("LOWER(source) = LOWER(${})", values.len()));
        }

        let mut sql = String::from(
            "SELECT internal_id, id, name, description, company_name, location, \
             work_type, salary_description, date_posted, date_scraped, source, \
             other, remark, job_class, job_subclass FROM jobs",
        );
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(&format!(
            " ORDER BY date_scraped DESC NULLS LAST LIMIT ${}",
            values.len() + 1
        ));

        let mut query_builder = sqlx::query_as::<_, JobRow>(&sql);
        for value in &values {
            query_builder = query_builder.bind(value);
        }
        let rows = query_builder.bind(filter.limit).fetch_all(&self.pool).await?;

        debug!("Listed {} jobs for filter {:?}", rows.len(), filter);
        Ok(rows)
    }

    /// Single-row update of one column, bumping the scrape timestamp.
    /// `column` comes from fixed call sites below, never from input.
    async fn set_column(
        &self,
        column: &'static str,
        job_id: &str,
        value: &str,
    ) -> Result<bool, sqlx::Error> {
        let sql = format!(
            "UPDATE jobs SET {} = $1, date_scraped = $2 WHERE id = $3",
            column
        );

        let result = sqlx::query(&sql)
            .bind(value)
            .bind(Utc::now().naive_utc())
            .bind(job_id)
            .execute(&self.pool)
            .await?;

        let updated = result.rows_affected() > 0;
        if !updated {
            debug!("No job found with id={} while updating {}", job_id, column);
        }
        Ok(updated)
    }
}

#[async_trait]
impl JobStore for JobRepository {
    async fn job_ids_by_internal_range(
        &self,
        start: i32,
        end: i32,
    ) -> Result<Vec<String>, sqlx::Error> {
        let ids = sqlx::query_scalar::<_, String>(
            r#"
            SELECT id FROM jobs
            WHERE internal_id BETWEEN $1 AND $2
            ORDER BY internal_id
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        debug!("Found {} job IDs in range {}-{}", ids.len(), start, end);
        Ok(ids)
    }

    async fn job_ids_missing_description(
        &self,
        limit: i64,
        retry_attempted: bool,
    ) -> Result<Vec<String>, sqlx::Error> {
        let ids = if retry_attempted {
            sqlx::query_scalar::<_, String>(
                r#"
                SELECT id FROM jobs
                WHERE description IS NULL OR description = ''
                   OR description = $2 OR description LIKE $3
                ORDER BY internal_id DESC
                LIMIT $1
                "#,
            )
            .bind(limit)
            .bind(EMPTY_SENTINEL)
            .bind(format!("{}%", ERROR_SENTINEL_PREFIX))
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_scalar::<_, String>(
                r#"
                SELECT id FROM jobs
                WHERE description IS NULL OR description = ''
                ORDER BY internal_id DESC
                LIMIT $1
                "#,
            )
            .bind(limit)
            .fetch_all(&self.pool)
            .await?
        };

        debug!("Found {} jobs missing a description", ids.len());
        Ok(ids)
    }

    async fn update_description(
        &self,
        job_id: &str,
        description: &str,
    ) -> Result<bool, sqlx::Error> {
        self.set_column("description", job_id, description).await
    }

    async fn update_title(&self, job_id: &str, title: &str) -> Result<bool, sqlx::Error> {
        self.set_column("name", job_id, title).await
    }

    async fn update_company(
        &self,
        job_id: &str,
        company_name: &str,
    ) -> Result<bool, sqlx::Error> {
        self.set_column("company_name", job_id, company_name).await
    }

    async fn update_class(&self, job_id: &str, job_class: &str) -> Result<bool, sqlx::Error> {
        self.set_column("job_class", job_id, job_class).await
    }
}
