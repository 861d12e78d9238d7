use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

/// Placeholder recorded when a scrape attempt found no usable description.
/// Distinguishes "attempted but empty" from "not yet attempted".
pub const EMPTY_SENTINEL: &str = "N/A";

/// Prefix recorded when a scrape attempt failed outright. The full marker
/// names the failure class, e.g. "Error: Timeout".
pub const ERROR_SENTINEL_PREFIX: &str = "Error:";

/// Database representation of a job listing with all fields
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct JobRow {
    pub internal_id: i32,
    /// Platform-assigned job ID, unique within one source
    pub id: String,
    /// Job title
    pub name: Option<String>,
    pub description: Option<String>,
    pub company_name: Option<String>,
    pub location: Option<String>,
    pub work_type: Option<String>,
    pub salary_description: Option<String>,
    /// Free-text posting date as shown on the listing ("3d ago")
    pub date_posted: Option<String>,
    /// Last time the pipeline wrote this row
    pub date_scraped: Option<NaiveDateTime>,
    pub source: Option<String>,
    pub other: Option<String>,
    pub remark: Option<String>,
    pub job_class: Option<String>,
    pub job_subclass: Option<String>,
}
