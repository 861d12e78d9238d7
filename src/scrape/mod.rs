pub mod http;

// Re-export commonly used types
pub use http::HttpDetailFetcher;

use async_trait::async_trait;
use std::fmt;

/// Supported job boards. Each variant resolves to a fixed scraping profile;
/// unsupported platform names are rejected at argument-parsing time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Platform {
    #[value(name = "jobsdb")]
    JobsDb,
    #[value(name = "linkedin")]
    LinkedIn,
    #[value(name = "glassdoor")]
    Glassdoor,
    #[value(name = "indeed")]
    Indeed,
}

/// Static scraping profile for one platform
pub struct PlatformProfile {
    /// Label stored in the jobs table's source column
    pub source_name: &'static str,
    /// Candidate selectors for the description, tried in order
    pub description_selectors: &'static [&'static str],
    /// Candidate selectors for the job title, tried in order
    pub title_selectors: &'static [&'static str],
    /// Candidate selectors for the company name, tried in order
    pub company_selectors: &'static [&'static str],
}

const JOBSDB_PROFILE: PlatformProfile = PlatformProfile {
    source_name: "JobsDB",
    description_selectors: &[".gg45di0._1apz9us0"],
    title_selectors: &[".job-title"],
    company_selectors: &[".company-name"],
};

const LINKEDIN_PROFILE: PlatformProfile = PlatformProfile {
    source_name: "LinkedIn",
    description_selectors: &[
        ".jobs-description__content",
        ".jobs-box__html-content",
        ".description__text",
        "[data-job-detail-type='description']",
    ],
    title_selectors: &[],
    company_selectors: &[],
};

const GLASSDOOR_PROFILE: PlatformProfile = PlatformProfile {
    source_name: "Glassdoor",
    description_selectors: &[".jobDescriptionContent", ".desc"],
    title_selectors: &[".css-1vg6q84", ".jobTitle"],
    company_selectors: &[".css-87uc0g", ".employerName"],
};

const INDEED_PROFILE: PlatformProfile = PlatformProfile {
    source_name: "Indeed",
    description_selectors: &["#jobDescriptionText"],
    title_selectors: &[".jobsearch-JobInfoHeader-title"],
    company_selectors: &[".jobsearch-InlineCompanyName"],
};

impl Platform {
    /// Scraping profile for this platform
    pub fn profile(self) -> &'static PlatformProfile {
        match self {
            Platform::JobsDb => &JOBSDB_PROFILE,
            Platform::LinkedIn => &LINKEDIN_PROFILE,
            Platform::Glassdoor => &GLASSDOOR_PROFILE,
            Platform::Indeed => &INDEED_PROFILE,
        }
    }

    /// Label stored in the jobs table's source column
    pub fn source_name(self) -> &'static str {
        self.profile().source_name
    }

    /// Detail page URL for one job ID
    pub fn detail_url(self, job_id: &str) -> String {
        match self {
            Platform::JobsDb => format!("https://hk.jobsdb.com/job/{}", job_id),
            Platform::LinkedIn => format!("https://www.linkedin.com/jobs/view/{}/", job_id),
            Platform::Glassdoor => {
                format!("https://www.glassdoor.com/job-listing/job.htm?jl={}", job_id)
            }
            Platform::Indeed => format!("https://www.indeed.com/viewjob?jk={}", job_id),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::JobsDb => "jobsdb",
            Platform::LinkedIn => "linkedin",
            Platform::Glassdoor => "glassdoor",
            Platform::Indeed => "indeed",
        };
        write!(f, "{}", name)
    }
}

/// Fields extracted from one job detail page. Only the description is
/// guaranteed by every platform profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDetail {
    pub description: String,
    pub title: Option<String>,
    pub company: Option<String>,
}

/// Fetch failures, classified for the error sentinel
#[derive(Debug)]
pub enum FetchError {
    /// Transport-level failure: connect, TLS, timeout, body read
    Request(reqwest::Error),
    /// Server answered with a non-success status
    Status(reqwest::StatusCode),
}

impl FetchError {
    /// Stable label for this failure class, recorded in the error sentinel
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Request(e) if e.is_timeout() => "Timeout",
            FetchError::Request(e) if e.is_connect() => "Connect",
            FetchError::Request(_) => "Request",
            FetchError::Status(_) => "Status",
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Request(e) => write!(f, "Request error: {}", e),
            FetchError::Status(status) => write!(f, "HTTP status {}", status),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Request(e) => Some(e),
            FetchError::Status(_) => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(value: reqwest::Error) -> Self {
        FetchError::Request(value)
    }
}

/// Trait for job detail fetchers (to allow mocking)
///
/// `Ok(None)` means the page was fetched but yielded no description; the
/// pipeline treats it the same as an empty description.
#[async_trait]
pub trait DetailFetcher: Send + Sync {
    async fn fetch_detail(&self, job_id: &str) -> Result<Option<JobDetail>, FetchError>;
}

/// Clean and normalize text: trim and collapse runs of whitespace
pub fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_urls_follow_platform_formats() {
        assert_eq!(
            Platform::JobsDb.detail_url("81234567"),
            "https://hk.jobsdb.com/job/81234567"
        );
        assert_eq!(
            Platform::LinkedIn.detail_url("3951820461"),
            "https://www.linkedin.com/jobs/view/3951820461/"
        );
        assert_eq!(
            Platform::Glassdoor.detail_url("1009312345678"),
            "https://www.glassdoor.com/job-listing/job.htm?jl=1009312345678"
        );
        assert_eq!(
            Platform::Indeed.detail_url("abc123def456"),
            "https://www.indeed.com/viewjob?jk=abc123def456"
        );
    }

    #[test]
    fn source_names_match_store_labels() {
        assert_eq!(Platform::JobsDb.source_name(), "JobsDB");
        assert_eq!(Platform::LinkedIn.source_name(), "LinkedIn");
        assert_eq!(Platform::Glassdoor.source_name(), "Glassdoor");
        assert_eq!(Platform::Indeed.source_name(), "Indeed");
    }

    #[test]
    fn clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  Senior\n\tRust   Engineer "), "Senior Rust Engineer");
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text(" \n "), "");
    }

    #[test]
    fn fetch_error_kinds_are_stable() {
        let status = FetchError::Status(reqwest::StatusCode::FORBIDDEN);
        assert_eq!(status.kind(), "Status");
        assert_eq!(format!("{}", status), "HTTP status 403 Forbidden");
    }
}
