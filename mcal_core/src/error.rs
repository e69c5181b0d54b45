//! Error types for feed handling and event normalization.

use thiserror::Error;

/// Why a single event could not be turned into a span.
///
/// These never abort a run; the event is dropped and counted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("event has no DTSTART")]
    MissingStart,

    #[error("property {0} has no value")]
    MissingValue(String),

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("invalid date-time: {0}")]
    InvalidDateTime(String),

    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    #[error("local time {local} does not exist in {tzid}")]
    NonexistentLocalTime { local: String, tzid: String },

    #[error("event bounds are out of range")]
    OutOfRange,

    #[error("event ends at or before its start")]
    EmptyInterval,
}

/// Failures while getting a feed. All of them are fatal for the run.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("could not fetch {locator}: {source}")]
    Fetch {
        locator: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("fetching {locator} returned {status}")]
    Status {
        locator: String,
        status: reqwest::StatusCode,
    },

    #[error("malformed calendar: {0}")]
    Parse(String),
}

/// Invalid or incomplete source configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid source `{0}`, expected KEY or KEY=LABEL")]
    InvalidSource(String),

    #[error("source {0} is not configured")]
    MissingSource(String),
}
