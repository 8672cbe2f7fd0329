use reqwest::{Client, RequestBuilder};
use std::env;
use tracing::error;

use crate::{Result, SurveyError};

/// Pick the GitHub token from the command line, falling back to `GITHUB_TOKEN`.
///
/// Blank values are treated as absent.
pub fn resolve_token(cli_token: Option<&str>) -> Result<String> {
    match cli_token {
        Some(t) if !t.trim().is_empty() => Ok(t.to_string()),
        _ => match env::var("GITHUB_TOKEN") {
            Ok(token) if !token.trim().is_empty() => Ok(token),
            _ => {
                error!("GitHub token not provided or found in environment");
                Err(SurveyError::MissingToken)
            }
        },
    }
}

/// Authenticated GitHub REST client shared by the collector and the fetcher.
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    token: String,
    api_url: String,
}

impl GitHubClient {
    pub fn new(token: impl Into<String>, api_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent("chaincode-survey")
            .build()?;

        Ok(GitHubClient {
            client,
            token: token.into(),
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    /// API root without a trailing slash.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// GET request carrying the bearer token and API version headers.
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("Bearer {}", self.token))
            .header("X-GitHub-Api-Version", "2022-11-28")
    }
}
