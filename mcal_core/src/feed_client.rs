//! This client fetches calendar feeds and parses them into raw events.

use std::{
    io::{BufReader, Cursor},
    sync::OnceLock,
    time::Duration,
};

use ical::{generator::IcalEvent, IcalParser};
use log::info;
use regex::Regex;
use reqwest::Client;

use crate::error::FeedError;

static DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the HTTP client shared by all fetches of a run.
pub fn client(timeout: Option<Duration>) -> Result<Client, FeedError> {
    Client::builder()
        .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
        .build()
        .map_err(FeedError::Client)
}

/// Rewrite `webcal://` locators to `https://` and trim whitespace.
pub fn normalize_locator(locator: &str) -> String {
    static WEBCAL_REGEX: OnceLock<Regex> = OnceLock::new();
    let webcal_regex =
        WEBCAL_REGEX.get_or_init(|| Regex::new(r"(?i)^webcal://").expect("webcal pattern is valid"));
    webcal_regex
        .replace(locator.trim(), "https://")
        .into_owned()
}

/// Get all events of the feed behind `locator`.
pub async fn get(client: &Client, locator: &str) -> Result<Vec<IcalEvent>, FeedError> {
    let ics = fetch(client, locator).await?;
    let events = parse(&ics)?;
    info!("fetched {} events from {}", events.len(), locator);
    Ok(events)
}

/// Fetch the raw feed text. A non-success status is an error.
pub async fn fetch(client: &Client, locator: &str) -> Result<String, FeedError> {
    let url = normalize_locator(locator);
    let fetch_error = |source: reqwest::Error| FeedError::Fetch {
        locator: url.clone(),
        source,
    };
    let response = client.get(&url).send().await.map_err(fetch_error)?;
    let status = response.status();
    if !status.is_success() {
        return Err(FeedError::Status {
            locator: url.clone(),
            status,
        });
    }
    response.text().await.map_err(fetch_error)
}

/// Parse an iCalendar document and collect the VEVENTs of all its calendars.
///
/// Other component kinds (VTODO, VJOURNAL, ...) are not events and are left out.
pub fn parse(ics: &str) -> Result<Vec<IcalEvent>, FeedError> {
    let parser = IcalParser::new(BufReader::new(Cursor::new(ics)));
    let mut events = vec![];
    for ical_calendar_result in parser {
        let ical_calendar = ical_calendar_result.map_err(|err| FeedError::Parse(err.to_string()))?;
        events.extend(ical_calendar.events);
    }
    Ok(events)
}
