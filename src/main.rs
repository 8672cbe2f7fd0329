use chaincode_survey_lib::{
    resolve_token, Args, AuditorConfig, CollectorConfig, Command, FetcherConfig, GitHubClient,
    KeywordAuditor, SearchCollector, SourceFetcher, SurveyError,
};
use clap::Parser;
use dotenv::dotenv;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), SurveyError> {
    // Initialize the tracing logger
    tracing_subscriber::fmt::init();

    dotenv().ok();

    let args = Args::parse();

    match args.command {
        Command::Collect(collect) => {
            let token = resolve_token(collect.token.as_deref())?;
            let github = GitHubClient::new(token, &collect.api_url)?;
            info!("Searching GitHub for '{}'", collect.query);
            SearchCollector::new(github, CollectorConfig::from(&collect))
                .run()
                .await?;
        }
        Command::Fetch(fetch) => {
            let token = resolve_token(fetch.token.as_deref())?;
            let github = GitHubClient::new(token, &fetch.api_url)?;
            info!("Fetching sources listed in '{}'", fetch.input);
            SourceFetcher::new(github, FetcherConfig::from(&fetch))
                .run()
                .await?;
        }
        Command::Audit(audit) => {
            info!("Auditing '{}' for '{}'", audit.dir, audit.keyword);
            KeywordAuditor::new(AuditorConfig::from(&audit)).run()?;
        }
    }

    Ok(())
}
