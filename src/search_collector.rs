use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::{HeaderMap, LINK};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::args::CollectArgs;
use crate::{GitHubClient, Result, SurveyError};

/// Settings for one search collection run.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub query: String,
    pub per_page: u32,
    pub page_delay: Duration,
    pub output_path: String,
}

impl From<&CollectArgs> for CollectorConfig {
    fn from(args: &CollectArgs) -> Self {
        CollectorConfig {
            query: args.query.clone(),
            per_page: args.per_page,
            page_delay: Duration::from_secs(args.page_delay_secs),
            output_path: args.output.clone(),
        }
    }
}

/// URLs found on one result page, and whether GitHub advertised another.
#[derive(Debug, Default)]
struct SearchPage {
    urls: Vec<String>,
    has_next: bool,
}

/// Pages through `/search/code` and records the `html_url` of every hit.
pub struct SearchCollector {
    github: GitHubClient,
    config: CollectorConfig,
}

impl SearchCollector {
    pub fn new(github: GitHubClient, config: CollectorConfig) -> Self {
        SearchCollector { github, config }
    }

    /// Collect, write the URL list (truncating it) and print the total.
    pub async fn run(&self) -> Result<usize> {
        let urls = self.collect().await;

        // One URL per line, replacing any previous run's list
        let mut contents = String::new();
        for url in &urls {
            contents.push_str(url);
            contents.push('\n');
        }
        tokio::fs::write(&self.config.output_path, contents).await?;

        info!("Saved {} URLs to '{}'", urls.len(), self.config.output_path);
        println!("Total URLs fetched: {}", urls.len());
        Ok(urls.len())
    }

    /// Fetch pages in order until one has no `rel="next"` link.
    ///
    /// The first failed page ends collection: whatever was gathered before it
    /// is returned and later pages are never requested.
    pub async fn collect(&self) -> Vec<String> {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        let mut urls = Vec::new();
        let mut page: u32 = 1;

        loop {
            pb.set_message(format!("Searching page {} ({} URLs so far)", page, urls.len()));
            pb.tick();

            match self.search_page(page).await {
                Ok(result) => {
                    info!("Page {}: {} results", page, result.urls.len());
                    urls.extend(result.urls);
                    if !result.has_next {
                        debug!("No next page after page {}", page);
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to fetch data on page {}: {}", page, e);
                    break;
                }
            }

            page += 1;

            // Fixed pause between pages to stay under the search rate limit.
            tokio::time::sleep(self.config.page_delay).await;
        }

        pb.finish_with_message(format!("Collected {} URLs", urls.len()));
        urls
    }

    async fn search_page(&self, page: u32) -> Result<SearchPage> {
        let url = format!("{}/search/code", self.github.api_url());
        let per_page = self.config.per_page.to_string();
        let page_param = page.to_string();

        debug!("Requesting {} page {}", url, page);
        let response = self
            .github
            .get(&url)
            .query(&[
                ("q", self.config.query.as_str()),
                ("per_page", per_page.as_str()),
                ("page", page_param.as_str()),
            ])
            .send()
            .await?;

        // Any failure ends the run; report when the rate limit resets.
        if !response.status().is_success() {
            if let Some(reset) = rate_limit_reset(response.headers()) {
                let wait = (reset - Utc::now()).num_seconds().max(0);
                warn!(
                    "Rate limit exhausted; it resets at {} ({}s from now)",
                    reset.to_rfc3339(),
                    wait
                );
            }
            return Err(SurveyError::Status {
                status: response.status(),
                url,
            });
        }

        let has_next = has_next_link(response.headers());

        // Parse the JSON response.
        let json: Value = response.json().await?;

        let Some(items) = json.get("items").and_then(Value::as_array) else {
            warn!("No 'items' array found in response for page {}", page);
            return Ok(SearchPage::default());
        };

        let mut urls = Vec::with_capacity(items.len());
        for item in items {
            match item.get("html_url").and_then(Value::as_str) {
                Some(html_url) => urls.push(html_url.to_string()),
                None => warn!("Search item without 'html_url' on page {}", page),
            }
        }

        Ok(SearchPage { urls, has_next })
    }
}

/// True when any `Link` header carries a `rel="next"` relation.
pub fn has_next_link(headers: &HeaderMap) -> bool {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|link| {
            link.split(';').skip(1).any(|param| {
                param
                    .trim()
                    .strip_prefix("rel=")
                    .map(|rel| rel.trim_matches('"').split_whitespace().any(|r| r == "next"))
                    .unwrap_or(false)
            })
        })
}

/// Reset instant when the response reports zero remaining requests.
fn rate_limit_reset(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    let remaining: u32 = headers
        .get("X-RateLimit-Remaining")?
        .to_str()
        .ok()?
        .parse()
        .ok()?;
    if remaining != 0 {
        return None;
    }
    let reset: i64 = headers
        .get("X-RateLimit-Reset")?
        .to_str()
        .ok()?
        .parse()
        .ok()?;
    DateTime::<Utc>::from_timestamp(reset, 0)
}
