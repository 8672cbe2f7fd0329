use clap::{Parser, Subcommand};

/// Default code search: Go files importing the Fabric chaincode shim.
pub const DEFAULT_QUERY: &str =
    "github.com/hyperledger/fabric-chaincode-go/shim in:file language:Go";

/// Default GitHub REST API root.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Chaincode survey CLI: find Fabric chaincode on GitHub, download it with
/// repository statistics, and audit the downloaded files for a keyword.
#[derive(Parser)]
#[clap(
    author,
    version,
    about,
    long_about = "Three sequential pipelines for surveying Hyperledger Fabric chaincode: collect search result URLs, fetch sources with repository statistics, and audit downloaded files for private data collection usage."
)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Page through GitHub code search and save every matched file URL.
    Collect(CollectArgs),
    /// Download each listed file together with its repository statistics.
    Fetch(FetchArgs),
    /// Mark which downloaded files contain a keyword.
    Audit(AuditArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct CollectArgs {
    /// Code search query, including qualifiers.
    #[clap(short, long, default_value = DEFAULT_QUERY)]
    pub query: String,

    /// Results requested per page (GitHub caps this at 100).
    #[clap(long, default_value = "100")]
    pub per_page: u32,

    /// Seconds to pause between result pages.
    #[clap(long, value_name = "SECS", default_value = "10")]
    pub page_delay_secs: u64,

    /// Output file, one URL per line. Overwritten on every run.
    #[clap(short, long, default_value = "github_urls_2.txt")]
    pub output: String,

    /// GitHub API root URL.
    #[clap(long, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// GitHub API token for authentication.
    #[clap(short, long)]
    pub token: Option<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct FetchArgs {
    /// File of browsable GitHub file URLs, one per line.
    #[clap(short, long, default_value = "github_urls.txt")]
    pub input: String,

    /// Directory the downloaded sources are written to.
    #[clap(long, default_value = "./code")]
    pub code_dir: String,

    /// Extension given to each downloaded file.
    #[clap(long, default_value = "go")]
    pub extension: String,

    /// Statistics table. Overwritten on every run.
    #[clap(short, long, default_value = "github_code_stats.csv")]
    pub output: String,

    /// Seconds to pause after every API request.
    #[clap(long, value_name = "SECS", default_value = "1")]
    pub request_delay_secs: u64,

    /// GitHub API root URL.
    #[clap(long, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// GitHub API token for authentication.
    #[clap(short, long)]
    pub token: Option<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct AuditArgs {
    /// Directory to scan recursively.
    #[clap(short, long, default_value = "./code")]
    pub dir: String,

    /// Case-sensitive substring to look for.
    #[clap(short, long, default_value = "PrivateData")]
    pub keyword: String,

    /// Keyword table. Overwritten on every run.
    #[clap(short, long, default_value = "PDC.csv")]
    pub output: String,
}
