use std::error::Error;
use std::fmt;

/// Error taxonomy for one generator run. `NotFound` is recoverable at the
/// fragment level; `Service` and `MissingInput` abort the run.
#[derive(Debug)]
pub enum SplitGenError {
    NotFound(String),
    Service(String),
    MissingInput(String),
    Io(std::io::Error),
    Http(reqwest::Error),
    Serde(serde_json::Error),
    Csv(csv::Error),
}

impl Error for SplitGenError {}

impl fmt::Display for SplitGenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SplitGenError::NotFound(what) => write!(f, "{what}"),
            SplitGenError::Service(msg) => write!(f, "Service error: {msg}"),
            SplitGenError::MissingInput(msg) => write!(f, "{msg}"),
            SplitGenError::Io(err) => write!(f, "I/O error: {err}"),
            SplitGenError::Http(err) => write!(f, "HTTP error: {err}"),
            SplitGenError::Serde(err) => write!(f, "JSON error: {err}"),
            SplitGenError::Csv(err) => write!(f, "Worksheet error: {err}"),
        }
    }
}

impl From<std::io::Error> for SplitGenError {
    fn from(err: std::io::Error) -> Self {
        SplitGenError::Io(err)
    }
}

impl From<reqwest::Error> for SplitGenError {
    fn from(err: reqwest::Error) -> Self {
        SplitGenError::Http(err)
    }
}

impl From<serde_json::Error> for SplitGenError {
    fn from(err: serde_json::Error) -> Self {
        SplitGenError::Serde(err)
    }
}

impl From<csv::Error> for SplitGenError {
    fn from(err: csv::Error) -> Self {
        SplitGenError::Csv(err)
    }
}

pub type Result<T> = std::result::Result<T, SplitGenError>;
