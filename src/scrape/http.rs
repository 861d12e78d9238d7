use rand::seq::SliceRandom;
use reqwest::header::USER_AGENT;
use scraper::{Html, Selector};
use tracing::debug;

use crate::config::ScraperConfig;
use crate::scrape::{clean_text, DetailFetcher, FetchError, JobDetail, Platform, PlatformProfile};

/// HTTP-backed detail fetcher. Each pipeline worker constructs its own
/// instance with its own client; nothing is shared across workers.
pub struct HttpDetailFetcher {
    platform: Platform,
    client: reqwest::Client,
    user_agents: Vec<String>,
}

impl HttpDetailFetcher {
    /// Build a fetcher for one platform with the given scraper settings
    pub fn new(platform: Platform, config: &ScraperConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            platform,
            client,
            user_agents: config.user_agents.clone(),
        })
    }

    /// Pick a random user agent for one request
    fn pick_user_agent(&self) -> Option<String> {
        let mut rng = rand::thread_rng();
        self.user_agents.choose(&mut rng).cloned()
    }
}

#[async_trait::async_trait]
impl DetailFetcher for HttpDetailFetcher {
    async fn fetch_detail(&self, job_id: &str) -> Result<Option<JobDetail>, FetchError> {
        let url = self.platform.detail_url(job_id);
        debug!("Fetching job detail: {}", url);

        let mut request = self.client.get(&url);
        if let Some(user_agent) = self.pick_user_agent() {
            request = request.header(USER_AGENT, user_agent);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await?;
        Ok(extract_detail(&body, self.platform.profile()))
    }
}

/// Walk the profile's selector lists over a parsed document. The document
/// is parsed and dropped here so the fetch future stays Send.
fn extract_detail(body: &str, profile: &PlatformProfile) -> Option<JobDetail> {
    let document = Html::parse_document(body);

    let description = select_first_text(&document, profile.description_selectors)?;
    let title = select_first_text(&document, profile.title_selectors);
    let company = select_first_text(&document, profile.company_selectors);

    Some(JobDetail {
        description,
        title,
        company,
    })
}

/// First non-empty text match across a candidate selector list
fn select_first_text(document: &Html, selectors: &[&str]) -> Option<String> {
    for raw in selectors {
        let selector = match Selector::parse(raw) {
            Ok(selector) => selector,
            Err(_) => continue,
        };
        if let Some(element) = document.select(&selector).next() {
            let text = clean_text(&element.text().collect::<Vec<_>>().join(" "));
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}
