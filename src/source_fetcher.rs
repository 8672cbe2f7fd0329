use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use indicatif::{ProgressBar, ProgressStyle};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::args::FetchArgs;
use crate::models::{write_table, RepoInfo, StatsRow};
use crate::{GitHubClient, Result, SurveyError};

/// Settings for one source fetching run.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub input_path: String,
    pub code_dir: PathBuf,
    pub extension: String,
    pub stats_path: String,
    pub request_delay: Duration,
}

impl From<&FetchArgs> for FetcherConfig {
    fn from(args: &FetchArgs) -> Self {
        FetcherConfig {
            input_path: args.input.clone(),
            code_dir: PathBuf::from(&args.code_dir),
            extension: args.extension.clone(),
            stats_path: args.output.clone(),
            request_delay: Duration::from_secs(args.request_delay_secs),
        }
    }
}

/// API endpoints derived from a browsable `github.com/.../blob/...` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub repo_url: String,
    pub content_url: String,
}

/// Map `https://github.com/{owner}/{repo}/blob/{ref}/{path}` onto the
/// repository and contents endpoints below `api_url`.
///
/// Returns `None` unless the URL has more than seven `/` segments, the host
/// segment is `github.com` and the sixth segment is `blob`. The ref segment is
/// dropped, so contents resolve against the default branch.
pub fn resolve_endpoints(url: &str, api_url: &str) -> Option<Endpoints> {
    let parts: Vec<&str> = url.split('/').collect();
    if parts.len() <= 7 || parts[2] != "github.com" || parts[5] != "blob" {
        return None;
    }

    let repo_url = format!(
        "{}/repos/{}/{}",
        api_url.trim_end_matches('/'),
        parts[3],
        parts[4]
    );
    let content_url = format!("{}/contents/{}", repo_url, parts[7..].join("/"));
    Some(Endpoints {
        repo_url,
        content_url,
    })
}

/// Number of `\n`-separated segments; the empty string counts as one.
pub fn count_lines(content: &str) -> usize {
    content.split('\n').count()
}

/// Decode the contents API `content` field, which GitHub wraps at 60 columns.
pub fn decode_content(encoded: &str) -> Result<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD.decode(compact)?;
    Ok(String::from_utf8(bytes)?)
}

/// Downloads each listed file with its repository statistics.
pub struct SourceFetcher {
    github: GitHubClient,
    config: FetcherConfig,
}

impl SourceFetcher {
    pub fn new(github: GitHubClient, config: FetcherConfig) -> Self {
        SourceFetcher { github, config }
    }

    /// Read the URL list, fetch everything and write the statistics table.
    pub async fn run(&self) -> Result<Vec<StatsRow>> {
        let input = tokio::fs::read_to_string(&self.config.input_path).await?;
        let urls: Vec<String> = input.lines().map(|line| line.trim().to_string()).collect();
        info!("Loaded {} URLs from '{}'", urls.len(), self.config.input_path);

        let rows = self.process(&urls).await?;

        write_table(&self.config.stats_path, &StatsRow::HEADERS, &rows)?;
        info!("Wrote {} rows to '{}'", rows.len(), self.config.stats_path);
        Ok(rows)
    }

    /// Fetch every URL in order, saving sources as `<index>.<extension>`.
    ///
    /// The index counts successful rows only; a URL whose content or
    /// repository fetch fails leaves no file and no row.
    pub async fn process(&self, urls: &[String]) -> Result<Vec<StatsRow>> {
        tokio::fs::create_dir_all(&self.config.code_dir).await?;

        let pb = ProgressBar::new(urls.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );

        let mut rows = Vec::new();

        for url in urls {
            pb.inc(1);
            pb.set_message(format!("{} saved", rows.len()));

            let Some(endpoints) = resolve_endpoints(url, self.github.api_url()) else {
                warn!("Skipping URL that is not a GitHub blob link: '{}'", url);
                continue;
            };

            // Both requests are made even when the first one fails.
            let code = self.fetch_source(&endpoints.content_url).await;
            let repo = self.fetch_repo_info(&endpoints.repo_url).await;

            let (Some(code), Some(repo)) = (code, repo) else {
                debug!("Dropping '{}' after a failed fetch", url);
                continue;
            };

            // Files are named by the count of rows written so far.
            let index = rows.len();
            let file_path = self
                .config
                .code_dir
                .join(format!("{}.{}", index, self.config.extension));
            tokio::fs::write(&file_path, &code).await?;

            rows.push(StatsRow {
                index,
                repo_url: endpoints.repo_url,
                watch: repo.watch,
                star: repo.star,
                fork: repo.fork,
                code_url: url.clone(),
                line_count: count_lines(&code),
            });
            debug!("Saved {} as {}", url, file_path.display());
        }

        pb.finish_with_message(format!("{} of {} files saved", rows.len(), urls.len()));
        Ok(rows)
    }

    /// Repository statistics, or `None` after logging any failure.
    pub async fn fetch_repo_info(&self, url: &str) -> Option<RepoInfo> {
        match self.get_json::<RepoInfo>(url).await {
            Ok(info) => Some(info),
            Err(e) => {
                error!("Fail to get repo {}: {}", url, e);
                None
            }
        }
    }

    /// Decoded file content, or `None` after logging any failure.
    ///
    /// Empty content counts as a failure, as does any `encoding` other than
    /// `base64` (GitHub answers `"none"` for files over 1 MB).
    pub async fn fetch_source(&self, url: &str) -> Option<String> {
        let result = self.get_json::<Value>(url).await.and_then(|json| {
            let encoding = json.get("encoding").and_then(Value::as_str).unwrap_or("base64");
            if encoding != "base64" {
                return Err(SurveyError::UnsupportedEncoding {
                    encoding: encoding.to_string(),
                    url: url.to_string(),
                });
            }

            let encoded = json
                .get("content")
                .and_then(Value::as_str)
                .ok_or_else(|| SurveyError::MissingContent(url.to_string()))?;
            let code = decode_content(encoded)?;
            if code.is_empty() {
                return Err(SurveyError::EmptyContent(url.to_string()));
            }
            Ok(code)
        });

        match result {
            Ok(code) => Some(code),
            Err(e) => {
                error!("Fail to get code {}: {}", url, e);
                None
            }
        }
    }

    /// GET `url` and parse a 200 response, pausing afterwards whatever happens.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let result = self.try_get_json(url).await;
        tokio::time::sleep(self.config.request_delay).await;
        result
    }

    async fn try_get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.github.get(url).send().await?;

        // Anything but 200 is a failure; log the body for diagnosis.
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            warn!("Err info: {}", body);
            return Err(SurveyError::Status {
                status,
                url: url.to_string(),
            });
        }
        Ok(response.json::<T>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const API: &str = "https://api.github.com";

    fn fetcher(server: &MockServer, code_dir: PathBuf) -> SourceFetcher {
        paced_fetcher(server, code_dir, Duration::ZERO)
    }

    fn paced_fetcher(server: &MockServer, code_dir: PathBuf, delay: Duration) -> SourceFetcher {
        let github = GitHubClient::new("secret", &server.uri()).unwrap();
        SourceFetcher::new(
            github,
            FetcherConfig {
                input_path: String::new(),
                code_dir,
                extension: "go".to_string(),
                stats_path: String::new(),
                request_delay: delay,
            },
        )
    }

    async fn mount_repo(server: &MockServer, repo: &str, stats: (u64, u64, u64)) {
        Mock::given(method("GET"))
            .and(path(format!("/repos/o/{}", repo)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": repo,
                "subscribers_count": stats.0,
                "stargazers_count": stats.1,
                "forks_count": stats.2,
            })))
            .mount(server)
            .await;
    }

    async fn mount_content(server: &MockServer, repo: &str, file: &str, text: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/repos/o/{}/contents/{}", repo, file)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "encoding": "base64",
                "content": STANDARD.encode(text),
            })))
            .mount(server)
            .await;
    }

    #[test]
    fn blob_url_maps_to_api_endpoints() {
        let endpoints =
            resolve_endpoints("https://github.com/owner/repo/blob/main/chaincode/cc.go", API)
                .unwrap();
        assert_eq!(endpoints.repo_url, "https://api.github.com/repos/owner/repo");
        assert_eq!(
            endpoints.content_url,
            "https://api.github.com/repos/owner/repo/contents/chaincode/cc.go"
        );
    }

    #[test]
    fn malformed_urls_resolve_to_nothing() {
        for url in [
            "",
            "not a url",
            "https://github.com/owner/repo/blob/main",
            "https://gitlab.com/owner/repo/blob/main/cc.go",
            "https://github.com/owner/repo/tree/main/cc.go",
            "https://api.github.com/owner/repo/blob/main/cc.go",
        ] {
            assert_eq!(resolve_endpoints(url, API), None, "{}", url);
        }
    }

    #[test]
    fn line_count_is_newline_segments() {
        assert_eq!(count_lines("a\nb\nc"), 3);
        assert_eq!(count_lines(""), 1);
        assert_eq!(count_lines("x\ny\n"), 3);
    }

    #[test]
    fn wrapped_base64_decodes() {
        let encoded = format!("{}\n", STANDARD.encode("package main\n"));
        let (head, tail) = encoded.split_at(8);
        let wrapped = format!("{}\n{}", head, tail);
        assert_eq!(decode_content(&wrapped).unwrap(), "package main\n");
    }

    #[test]
    fn non_utf8_content_is_rejected() {
        let encoded = STANDARD.encode([0xffu8, 0xfe, 0x00]);
        assert!(matches!(decode_content(&encoded), Err(SurveyError::Utf8(_))));
    }

    #[tokio::test]
    async fn index_only_advances_on_success() {
        let server = MockServer::start().await;
        mount_repo(&server, "a", (1, 2, 3)).await;
        mount_content(&server, "a", "a.go", "package a").await;
        // repo "b" has content but its metadata request 404s
        mount_content(&server, "b", "b.go", "package b").await;
        mount_repo(&server, "c", (4, 5, 6)).await;
        mount_content(&server, "c", "c.go", "package c\n\nfunc C() {}").await;

        let dir = tempfile::tempdir().unwrap();
        let urls: Vec<String> = [
            "https://github.com/o/a/blob/main/a.go",
            "https://github.com/o/b/blob/main/b.go",
            "https://example.com/not/a/blob/link",
            "https://github.com/o/c/blob/main/c.go",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let rows = fetcher(&server, dir.path().to_path_buf())
            .process(&urls)
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].index, 0);
        assert_eq!(rows[0].code_url, urls[0]);
        assert_eq!(rows[1].index, 1);
        assert_eq!(rows[1].code_url, urls[3]);
        assert_eq!(rows[1].repo_url, format!("{}/repos/o/c", server.uri()));
        assert_eq!((rows[1].watch, rows[1].star, rows[1].fork), (4, 5, 6));
        assert_eq!(rows[1].line_count, 3);

        assert_eq!(std::fs::read_to_string(dir.path().join("0.go")).unwrap(), "package a");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("1.go")).unwrap(),
            "package c\n\nfunc C() {}"
        );
        assert!(!dir.path().join("2.go").exists());
    }

    #[tokio::test]
    async fn missing_content_field_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/o/r/contents/dir"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "name": "a.go" }])))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let fetcher = fetcher(&server, dir.path().to_path_buf());
        let url = format!("{}/repos/o/r/contents/dir", server.uri());
        assert_eq!(fetcher.fetch_source(&url).await, None);
    }

    #[tokio::test]
    async fn oversized_or_empty_files_leave_no_row() {
        let server = MockServer::start().await;
        mount_repo(&server, "big", (1, 1, 1)).await;
        Mock::given(method("GET"))
            .and(path("/repos/o/big/contents/big.go"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "encoding": "none",
                "content": "",
            })))
            .mount(&server)
            .await;
        mount_repo(&server, "empty", (1, 1, 1)).await;
        mount_content(&server, "empty", "empty.go", "").await;
        mount_repo(&server, "ok", (7, 8, 9)).await;
        mount_content(&server, "ok", "ok.go", "package ok").await;

        let dir = tempfile::tempdir().unwrap();
        let urls: Vec<String> = [
            "https://github.com/o/big/blob/main/big.go",
            "https://github.com/o/empty/blob/main/empty.go",
            "https://github.com/o/ok/blob/main/ok.go",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let rows = fetcher(&server, dir.path().to_path_buf())
            .process(&urls)
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].index, 0);
        assert_eq!(rows[0].code_url, urls[2]);
        assert_eq!(std::fs::read_to_string(dir.path().join("0.go")).unwrap(), "package ok");
        assert!(!dir.path().join("1.go").exists());
    }

    #[tokio::test]
    async fn every_request_is_followed_by_a_pause() {
        // No mocks mounted: both requests for the URL fail with 404.
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let delay = Duration::from_millis(150);
        let fetcher = paced_fetcher(&server, dir.path().to_path_buf(), delay);
        let urls = vec!["https://github.com/o/r/blob/main/r.go".to_string()];

        let started = std::time::Instant::now();
        let rows = fetcher.process(&urls).await.unwrap();

        assert!(rows.is_empty());
        assert!(started.elapsed() >= delay * 2, "elapsed {:?}", started.elapsed());
    }

    #[tokio::test]
    async fn unreachable_host_is_absent() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let fetcher = fetcher(&server, dir.path().to_path_buf());

        assert_eq!(fetcher.fetch_repo_info("http://127.0.0.1:1/repos/o/r").await, None);
    }
}
