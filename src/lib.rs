//! # Chaincode Survey
//!
//! Three sequential pipelines for surveying Hyperledger Fabric chaincode
//! published on GitHub. They share nothing but the files they hand to each
//! other:
//!
//! 1. [`SearchCollector`] pages through GitHub code search and writes the
//!    matched file URLs, one per line.
//! 2. [`SourceFetcher`] downloads each listed file with its repository's
//!    watch/star/fork counts, saving sources as `<index>.go` and a statistics
//!    CSV.
//! 3. [`KeywordAuditor`] walks the downloaded files and records which of them
//!    contain a keyword such as `PrivateData`.
//!
//! ## Example
//!
//! ```no_run
//! use chaincode_survey_lib::{
//!     resolve_token, CollectorConfig, GitHubClient, SearchCollector, DEFAULT_API_URL,
//!     DEFAULT_QUERY,
//! };
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), chaincode_survey_lib::SurveyError> {
//!     let token = resolve_token(None)?;
//!     let github = GitHubClient::new(token, DEFAULT_API_URL)?;
//!
//!     let collector = SearchCollector::new(
//!         github,
//!         CollectorConfig {
//!             query: DEFAULT_QUERY.to_string(),
//!             per_page: 100,
//!             page_delay: Duration::from_secs(10),
//!             output_path: "github_urls_2.txt".to_string(),
//!         },
//!     );
//!     collector.run().await?;
//!
//!     Ok(())
//! }
//! ```

mod args;
mod client;
mod error;
mod keyword_auditor;
mod models;
mod search_collector;
mod source_fetcher;

pub use crate::args::{
    Args, AuditArgs, CollectArgs, Command, FetchArgs, DEFAULT_API_URL, DEFAULT_QUERY,
};
pub use crate::client::{resolve_token, GitHubClient};
pub use crate::error::{Result, SurveyError};
pub use crate::keyword_auditor::{file_contains, scan_directory, AuditorConfig, KeywordAuditor};
pub use crate::models::{KeywordRow, RepoInfo, StatsRow};
pub use crate::search_collector::{has_next_link, CollectorConfig, SearchCollector};
pub use crate::source_fetcher::{
    count_lines, decode_content, resolve_endpoints, Endpoints, FetcherConfig, SourceFetcher,
};
