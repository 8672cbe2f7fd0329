use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised while collecting, fetching or auditing chaincode.
#[derive(Debug, Error)]
pub enum SurveyError {
    #[error("GitHub token is required")]
    MissingToken,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} on {url}")]
    Status { status: StatusCode, url: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid base64 content: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("content is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("response from {0} has no 'content' field")]
    MissingContent(String),

    #[error("unsupported content encoding '{encoding}' from {url}")]
    UnsupportedEncoding { encoding: String, url: String },

    #[error("empty content from {0}")]
    EmptyContent(String),
}

pub type Result<T> = std::result::Result<T, SurveyError>;
