use serde::{Deserialize, Serialize};

/// Repository statistics as returned by `GET /repos/{owner}/{repo}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepoInfo {
    pub name: String,
    #[serde(rename = "subscribers_count")]
    pub watch: u64,
    #[serde(rename = "stargazers_count")]
    pub star: u64,
    #[serde(rename = "forks_count")]
    pub fork: u64,
}

/// One row of the fetcher's statistics table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsRow {
    #[serde(rename = "Index")]
    pub index: usize,
    #[serde(rename = "Repo URL")]
    pub repo_url: String,
    #[serde(rename = "Watch")]
    pub watch: u64,
    #[serde(rename = "Star")]
    pub star: u64,
    #[serde(rename = "Fork")]
    pub fork: u64,
    #[serde(rename = "Code URL")]
    pub code_url: String,
    #[serde(rename = "Line Count")]
    pub line_count: usize,
}

impl StatsRow {
    pub const HEADERS: [&'static str; 7] = [
        "Index",
        "Repo URL",
        "Watch",
        "Star",
        "Fork",
        "Code URL",
        "Line Count",
    ];
}

/// One row of the keyword table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordRow {
    #[serde(rename = "File Name")]
    pub file_name: String,
    #[serde(rename = "Contains Keyword")]
    pub contains_keyword: u8,
}

impl KeywordRow {
    pub const HEADERS: [&'static str; 2] = ["File Name", "Contains Keyword"];
}

/// Write `rows` as CSV under an explicit header row, truncating `path`.
///
/// The header is written even when `rows` is empty.
pub(crate) fn write_table<T: Serialize>(
    path: &str,
    headers: &[&str],
    rows: &[T],
) -> crate::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(headers)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
