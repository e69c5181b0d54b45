//! The two merge runs: fetch the configured feeds, then project them into one
//! calendar.

use anyhow::{Context, Result};
use ical::generator::{IcalCalendar, IcalEvent};
use log::{info, warn};
use reqwest::Client;

use crate::{
    calendar::{assemble, Policy},
    config::SourceConfig,
    error::ConfigError,
    event::{normalize_all, UTC_FORMAT},
    feed_client,
    horizon::Horizon,
    merge::{merge, Interval},
    projection::{busy_event, LabeledEvent, BUSY_LABEL},
};

/// The raw events of one fetched source.
#[derive(Debug, Clone)]
pub struct Feed {
    pub source: SourceConfig,
    pub events: Vec<IcalEvent>,
}

fn log_skipped(key: &str, skipped: usize) {
    if skipped > 0 {
        warn!("dropped {skipped} malformed events from {key}");
    }
}

/// Build the labeled calendar: every event inside the horizon, one output event
/// each, summary replaced by its source's label.
pub fn labeled_calendar(feeds: &[Feed], horizon: &Horizon) -> IcalCalendar {
    let stamp = horizon.now().format(UTC_FORMAT).to_string();
    let mut events = vec![];
    for feed in feeds {
        let label = feed.source.label.as_deref().unwrap_or(BUSY_LABEL);
        let normalized = normalize_all(&feed.events);
        log_skipped(&feed.source.key, normalized.skipped);
        for (event, span) in normalized.spans {
            if !horizon.keeps(&span) {
                continue;
            }
            let labeled_event = LabeledEvent::new(&feed.source.key, label, event, span);
            events.push(labeled_event.to_ical_event(&stamp));
        }
    }
    info!("publishing {} labeled events", events.len());
    assemble(Policy::Labeled, events)
}

/// Build the busy calendar: all events inside the horizon, pooled across
/// sources and merged into anonymous blocks.
pub fn busy_calendar(feeds: &[Feed], horizon: &Horizon) -> IcalCalendar {
    let stamp = horizon.now().format(UTC_FORMAT).to_string();
    let mut intervals: Vec<Interval> = vec![];
    for feed in feeds {
        let normalized = normalize_all(&feed.events);
        log_skipped(&feed.source.key, normalized.skipped);
        intervals.extend(
            normalized
                .spans
                .iter()
                .map(|(_, span)| span.interval())
                .filter(|interval| horizon.overlaps(interval)),
        );
    }
    let pooled = intervals.len();
    let blocks = merge(intervals);
    info!(
        "merged {pooled} events into {} busy blocks",
        blocks.len()
    );
    let events = blocks
        .iter()
        .map(|block| busy_event(block, &stamp))
        .collect();
    assemble(Policy::Busy, events)
}

/// Fetch every source whose locator is set. Unset sources are skipped; a set
/// source that cannot be fetched fails the run.
pub async fn fetch_labeled_feeds(
    client: &Client,
    sources: &[SourceConfig],
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Vec<Feed>> {
    let mut feeds = vec![];
    for source in sources {
        let Some(locator) = source.locator(&lookup) else {
            info!("{} is not set, skipping", source.key);
            continue;
        };
        let events = feed_client::get(client, &locator)
            .await
            .with_context(|| format!("could not get source {}", source.key))?;
        feeds.push(Feed {
            source: source.clone(),
            events,
        });
    }
    Ok(feeds)
}

/// Fetch every source. All locators must be set; this is checked before any
/// request goes out.
pub async fn fetch_busy_feeds(
    client: &Client,
    sources: &[SourceConfig],
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Vec<Feed>> {
    let located = sources
        .iter()
        .map(|source| {
            source
                .locator(&lookup)
                .map(|locator| (source, locator))
                .ok_or_else(|| ConfigError::MissingSource(source.key.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let mut feeds = vec![];
    for (source, locator) in located {
        let events = feed_client::get(client, &locator)
            .await
            .with_context(|| format!("could not get source {}", source.key))?;
        feeds.push(Feed {
            source: source.clone(),
            events,
        });
    }
    Ok(feeds)
}

pub async fn run_labeled(
    client: &Client,
    sources: &[SourceConfig],
    lookup: impl Fn(&str) -> Option<String>,
    horizon: &Horizon,
) -> Result<IcalCalendar> {
    let feeds = fetch_labeled_feeds(client, sources, lookup).await?;
    Ok(labeled_calendar(&feeds, horizon))
}

pub async fn run_busy(
    client: &Client,
    sources: &[SourceConfig],
    lookup: impl Fn(&str) -> Option<String>,
    horizon: &Horizon,
) -> Result<IcalCalendar> {
    let feeds = fetch_busy_feeds(client, sources, lookup).await?;
    Ok(busy_calendar(&feeds, horizon))
}
