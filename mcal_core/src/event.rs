//! Normalization of raw VEVENTs into comparable spans.
//!
//! A VEVENT may be all-day or timed, may end with DTEND, DURATION or nothing
//! at all, and may carry a TZID, a UTC suffix or no zone information. All of
//! these end up as a [`Span`], which downstream code matches on instead of
//! looking at raw property shapes.

use std::sync::OnceLock;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use ical::{
    generator::{IcalEvent, Property},
    ical_param,
};
use log::debug;
use regex::Regex;

use crate::{
    error::NormalizeError,
    merge::Interval,
    property::{GetIcalParam, GetIcalProperty},
};

pub(crate) static DATE_FORMAT: &str = "%Y%m%d";
pub(crate) static DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";
pub(crate) static UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// A date-time value in the shape the feed delivered it.
#[derive(Debug, Clone, PartialEq)]
pub enum Timestamp {
    /// `...Z`
    Utc(DateTime<Utc>),
    /// Local time with a TZID known to the timezone database.
    Zoned(DateTime<Tz>),
    /// Local time without a resolvable zone. An unknown TZID is kept verbatim
    /// so it can be written back out.
    Floating {
        local: NaiveDateTime,
        tzid: Option<String>,
    },
    /// A date-only end of a timed event, read as midnight UTC.
    Date(NaiveDate),
}

impl Timestamp {
    /// The instant in UTC. Floating values are taken to already be UTC.
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            Timestamp::Utc(value) => *value,
            Timestamp::Zoned(value) => value.with_timezone(&Utc),
            Timestamp::Floating { local, .. } => Utc.from_utc_datetime(local),
            Timestamp::Date(date) => Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)),
        }
    }

    fn checked_add(&self, duration: Duration) -> Option<Timestamp> {
        let timestamp = match self {
            Timestamp::Utc(value) => Timestamp::Utc(value.checked_add_signed(duration)?),
            Timestamp::Zoned(value) => Timestamp::Zoned(value.checked_add_signed(duration)?),
            Timestamp::Floating { local, tzid } => Timestamp::Floating {
                local: local.checked_add_signed(duration)?,
                tzid: tzid.clone(),
            },
            Timestamp::Date(date) => Timestamp::Floating {
                local: date.and_time(NaiveTime::MIN).checked_add_signed(duration)?,
                tzid: None,
            },
        };
        Some(timestamp)
    }

    /// Build a property holding this value, keeping its zone information.
    pub fn to_property(&self, name: &str) -> Property {
        let (value, params) = match self {
            Timestamp::Utc(value) => (value.format(UTC_FORMAT).to_string(), None),
            Timestamp::Zoned(value) => (
                value.naive_local().format(DATE_TIME_FORMAT).to_string(),
                Some(vec![ical_param!("TZID", value.timezone().name())]),
            ),
            Timestamp::Floating { local, tzid } => (
                local.format(DATE_TIME_FORMAT).to_string(),
                tzid.as_deref().map(|tzid| vec![ical_param!("TZID", tzid)]),
            ),
            Timestamp::Date(date) => (
                date.format(DATE_FORMAT).to_string(),
                Some(vec![ical_param!("VALUE", "DATE")]),
            ),
        };
        Property {
            name: name.to_string(),
            value: Some(value),
            params,
        }
    }
}

/// The normalized extent of one event.
///
/// Only [`Span::all_day`] and [`Span::timed`] build one, so the end is always
/// after the start.
#[derive(Debug, Clone, PartialEq)]
pub struct Span(Bounds);

/// The bounds of a [`Span`], by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Bounds {
    /// Whole days, `end` exclusive.
    AllDay { start: NaiveDate, end: NaiveDate },
    Timed { start: Timestamp, end: Timestamp },
}

impl Span {
    pub fn all_day(start: NaiveDate, end: NaiveDate) -> Result<Span, NormalizeError> {
        if end <= start {
            return Err(NormalizeError::EmptyInterval);
        }
        Ok(Span(Bounds::AllDay { start, end }))
    }

    pub fn timed(start: Timestamp, end: Timestamp) -> Result<Span, NormalizeError> {
        if end.to_utc() <= start.to_utc() {
            return Err(NormalizeError::EmptyInterval);
        }
        Ok(Span(Bounds::Timed { start, end }))
    }

    pub fn bounds(&self) -> &Bounds {
        &self.0
    }

    pub fn is_all_day(&self) -> bool {
        matches!(self.0, Bounds::AllDay { .. })
    }

    /// The span as a UTC interval. All-day bounds become UTC midnight.
    pub fn interval(&self) -> Interval {
        match &self.0 {
            Bounds::AllDay { start, end } => Interval::from_ordered(
                Utc.from_utc_datetime(&start.and_time(NaiveTime::MIN)),
                Utc.from_utc_datetime(&end.and_time(NaiveTime::MIN)),
            ),
            Bounds::Timed { start, end } => Interval::from_ordered(start.to_utc(), end.to_utc()),
        }
    }
}

/// A parsed DATE or DATE-TIME property value.
#[derive(Debug, Clone, PartialEq)]
enum Value {
    Date(NaiveDate),
    DateTime(Timestamp),
}

impl Value {
    fn date(&self) -> NaiveDate {
        match self {
            Value::Date(date) => *date,
            Value::DateTime(Timestamp::Utc(value)) => value.date_naive(),
            Value::DateTime(Timestamp::Zoned(value)) => value.date_naive(),
            Value::DateTime(Timestamp::Floating { local, .. }) => local.date(),
            Value::DateTime(Timestamp::Date(date)) => *date,
        }
    }

    fn into_timestamp(self) -> Timestamp {
        match self {
            Value::Date(date) => Timestamp::Date(date),
            Value::DateTime(timestamp) => timestamp,
        }
    }
}

fn parse_value(property: &Property) -> Result<Value, NormalizeError> {
    let raw = property
        .value
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| NormalizeError::MissingValue(property.name.clone()))?;
    if !raw.contains(['T', 't']) {
        let date = NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map_err(|_| NormalizeError::InvalidDate(raw.to_string()))?;
        return Ok(Value::Date(date));
    }
    let (local, is_utc) = match raw.strip_suffix(['Z', 'z']) {
        Some(local) => (local, true),
        None => (raw, false),
    };
    let local = NaiveDateTime::parse_from_str(&local.to_ascii_uppercase(), DATE_TIME_FORMAT)
        .map_err(|_| NormalizeError::InvalidDateTime(raw.to_string()))?;
    if is_utc {
        return Ok(Value::DateTime(Timestamp::Utc(Utc.from_utc_datetime(&local))));
    }
    let Some(tzid) = property.get_ical_param("TZID") else {
        return Ok(Value::DateTime(Timestamp::Floating { local, tzid: None }));
    };
    match tzid.trim_start_matches('/').parse::<Tz>() {
        Ok(tz) => tz
            .from_local_datetime(&local)
            .earliest()
            .map(|value| Value::DateTime(Timestamp::Zoned(value)))
            .ok_or_else(|| NormalizeError::NonexistentLocalTime {
                local: local.to_string(),
                tzid: tzid.to_string(),
            }),
        Err(_) => {
            debug!("unknown TZID {tzid}, treating {raw} as floating");
            Ok(Value::DateTime(Timestamp::Floating {
                local,
                tzid: Some(tzid.to_string()),
            }))
        }
    }
}

fn duration_regex() -> &'static Regex {
    static DURATION_REGEX: OnceLock<Regex> = OnceLock::new();
    DURATION_REGEX.get_or_init(|| {
        Regex::new(
            r"(?x)^
                (?P<sign>[+-])?
                P
                (?:(?P<weeks>\d+)W)?
                (?:(?P<days>\d+)D)?
                (?:T
                    (?:(?P<hours>\d+)H)?
                    (?:(?P<minutes>\d+)M)?
                    (?:(?P<seconds>\d+)S)?
                )?
            $",
        )
        .expect("duration pattern is valid")
    })
}

/// Parse an RFC 5545 duration such as `PT1H30M`, `P2D` or `-P1W`.
pub fn parse_duration(raw: &str) -> Result<Duration, NormalizeError> {
    let invalid = || NormalizeError::InvalidDuration(raw.to_string());
    let raw_upper = raw.trim().to_ascii_uppercase();
    let captures = duration_regex().captures(&raw_upper).ok_or_else(invalid)?;
    let mut seconds: i64 = 0;
    let mut has_component = false;
    for (group, unit_seconds) in [
        ("weeks", 7 * 24 * 60 * 60),
        ("days", 24 * 60 * 60),
        ("hours", 60 * 60),
        ("minutes", 60),
        ("seconds", 1),
    ] {
        let Some(value) = captures.name(group) else {
            continue;
        };
        let value: u32 = value.as_str().parse().map_err(|_| invalid())?;
        seconds += i64::from(value) * unit_seconds;
        has_component = true;
    }
    if !has_component {
        return Err(invalid());
    }
    if captures.name("sign").is_some_and(|sign| sign.as_str() == "-") {
        seconds = -seconds;
    }
    Ok(Duration::seconds(seconds))
}

/// Annotation first, representation second. Some producers only set one.
fn is_all_day(dtstart: &Property, start: &Value) -> bool {
    if dtstart
        .get_ical_param("VALUE")
        .is_some_and(|value| value.eq_ignore_ascii_case("DATE"))
    {
        return true;
    }
    matches!(start, Value::Date(_))
}

/// Normalize one event into a span.
pub fn normalize(event: &IcalEvent) -> Result<Span, NormalizeError> {
    let dtstart = event
        .get_ical_property("DTSTART")
        .ok_or(NormalizeError::MissingStart)?;
    let start = parse_value(dtstart)?;
    let end = event
        .get_ical_property("DTEND")
        .map(parse_value)
        .transpose()?;
    let duration = match end {
        Some(_) => None,
        None => event
            .get_ical_property_value("DURATION")
            .map(|raw| parse_duration(raw))
            .transpose()?,
    };
    if is_all_day(dtstart, &start) {
        all_day_span(start, end, duration)
    } else {
        timed_span(start, end, duration)
    }
}

fn all_day_span(
    start: Value,
    end: Option<Value>,
    duration: Option<Duration>,
) -> Result<Span, NormalizeError> {
    let start = start.date();
    let end = match (end, duration) {
        (Some(end), _) => end.date(),
        (None, Some(duration)) if duration.num_days() > 0 => start
            .checked_add_signed(Duration::days(duration.num_days()))
            .ok_or(NormalizeError::OutOfRange)?,
        // A DURATION shorter than a day still covers the start date.
        (None, _) => start
            .checked_add_signed(Duration::days(1))
            .ok_or(NormalizeError::OutOfRange)?,
    };
    Span::all_day(start, end)
}

fn timed_span(
    start: Value,
    end: Option<Value>,
    duration: Option<Duration>,
) -> Result<Span, NormalizeError> {
    let start = start.into_timestamp();
    let end = match (end, duration) {
        (Some(end), _) => end.into_timestamp(),
        (None, Some(duration)) => start
            .checked_add(duration)
            .ok_or(NormalizeError::OutOfRange)?,
        (None, None) => start
            .checked_add(Duration::hours(1))
            .ok_or(NormalizeError::OutOfRange)?,
    };
    Span::timed(start, end)
}

/// The spans of a feed's events, plus how many events were dropped.
#[derive(Debug, Default)]
pub struct Normalized<'a> {
    pub spans: Vec<(&'a IcalEvent, Span)>,
    pub skipped: usize,
}

/// Normalize every event, dropping the ones that fail.
pub fn normalize_all(events: &[IcalEvent]) -> Normalized<'_> {
    let mut normalized = Normalized::default();
    for event in events {
        match normalize(event) {
            Ok(span) => normalized.spans.push((event, span)),
            Err(err) => {
                debug!(
                    "dropping event {}: {err}",
                    event
                        .get_ical_property_value("UID")
                        .map_or("without UID", String::as_str)
                );
                normalized.skipped += 1;
            }
        }
    }
    normalized
}
