use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Bad or missing input, detected before any network activity
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Scrape(#[from] ScrapeError),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },
}

/// The portal returned markup or JSON we could not make sense of
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("login form field `{0}` not found")]
    MissingField(&'static str),

    #[error("chart data attribute not found in report page")]
    ChartNotFound,

    #[error("chart data is not valid JSON: {0}")]
    InvalidChartJson(#[source] serde_json::Error),

    #[error("chart data has no `{0}` series")]
    MissingSeries(&'static str),

    #[error("malformed sample in `{series}` series: {source}")]
    InvalidSample {
        series: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("timestamp {0:?} is not a millisecond epoch")]
    InvalidTimestamp(String),

    #[error("timestamp {0} is out of range")]
    TimestampOutOfRange(i64),

    #[error("invalid selector: {0}")]
    Selector(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport(TransportError::Request(e))
    }
}
