//! End-to-end tests of both calendar projections on in-memory feeds.

use chrono::{DateTime, TimeZone, Utc};
use mcal_core::{
    config::SourceConfig,
    feed_client::parse,
    horizon::{Horizon, DEFAULT_HORIZON_DAYS},
    ical::generator::{Emitter, IcalEvent},
    pipeline::{busy_calendar, labeled_calendar, Feed},
    property::{GetIcalParam, GetIcalProperty},
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 30, 8, 0, 0).unwrap()
}

fn horizon() -> Horizon {
    Horizon::new(now(), DEFAULT_HORIZON_DAYS)
}

fn feed(key: &str, label: Option<&str>, events: &[&str]) -> Feed {
    let body: String = events
        .iter()
        .map(|lines| format!("BEGIN:VEVENT\n{lines}\nEND:VEVENT\n"))
        .collect();
    let ics = format!("BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:-//test//test//\n{body}END:VCALENDAR\n");
    Feed {
        source: SourceConfig::new(key, label),
        events: parse(&ics).unwrap(),
    }
}

fn value<'a>(event: &'a IcalEvent, name: &str) -> &'a str {
    event.get_ical_property_value(name).unwrap()
}

#[test]
fn test_overlapping_sources_merge_into_one_busy_block() {
    let feeds = [
        feed(
            "ICS_URL_A",
            None,
            &["UID:a\nDTSTART:20240601T090000Z\nDTEND:20240601T100000Z\nSUMMARY:Board meeting"],
        ),
        feed(
            "ICS_URL_B",
            None,
            &["UID:b\nDTSTART:20240601T093000Z\nDTEND:20240601T103000Z\nSUMMARY:Doctor"],
        ),
    ];
    let calendar = busy_calendar(&feeds, &horizon());
    assert_eq!(calendar.events.len(), 1);
    let block = &calendar.events[0];
    assert_eq!(value(block, "SUMMARY"), "Busy");
    assert_eq!(value(block, "DTSTART"), "20240601T090000Z");
    assert_eq!(value(block, "DTEND"), "20240601T103000Z");
    assert_eq!(value(block, "DTSTAMP"), "20240530T080000Z");

    let ics = calendar.generate();
    assert!(!ics.contains("Board meeting"));
    assert!(!ics.contains("Doctor"));
}

#[test]
fn test_all_day_event_without_end_is_labeled() {
    let feeds = [feed(
        "ICS_URL_A",
        Some("Alice busy"),
        &["UID:holiday\nDTSTART;VALUE=DATE:20240601\nSUMMARY:Holiday"],
    )];
    let calendar = labeled_calendar(&feeds, &horizon());
    assert_eq!(calendar.events.len(), 1);
    let event = &calendar.events[0];
    assert_eq!(value(event, "SUMMARY"), "Alice busy");
    let dtstart = event.get_ical_property("DTSTART").unwrap();
    assert_eq!(dtstart.value.as_deref(), Some("20240601"));
    assert_eq!(dtstart.get_ical_param("VALUE"), Some("DATE"));
    let dtend = event.get_ical_property("DTEND").unwrap();
    assert_eq!(dtend.value.as_deref(), Some("20240602"));
    assert_eq!(dtend.get_ical_param("VALUE"), Some("DATE"));
}

#[test]
fn test_event_beyond_horizon_is_dropped() {
    let feeds = [feed(
        "ICS_URL_A",
        Some("Alice busy"),
        &["UID:far\nDTSTART:20241216T080000Z\nDTEND:20241216T090000Z"],
    )];
    assert!(labeled_calendar(&feeds, &horizon()).events.is_empty());
    assert!(busy_calendar(&feeds, &horizon()).events.is_empty());
}

#[test]
fn test_past_events_are_dropped() {
    let feeds = [feed(
        "ICS_URL_A",
        Some("Alice busy"),
        &[
            "UID:past\nDTSTART:20240529T080000Z\nDTEND:20240530T070000Z",
            "UID:running\nDTSTART:20240530T070000Z\nDTEND:20240530T090000Z",
        ],
    )];
    let calendar = labeled_calendar(&feeds, &horizon());
    assert_eq!(calendar.events.len(), 1);
    assert_eq!(value(&calendar.events[0], "DTSTART"), "20240530T070000Z");
}

#[test]
fn test_malformed_event_does_not_fail_the_feed() {
    let feeds = [feed(
        "ICS_URL_A",
        Some("Alice busy"),
        &[
            "UID:ok-1\nDTSTART:20240601T090000Z",
            "UID:broken\nDTSTART:not a date",
            "UID:no-start\nSUMMARY:nothing",
            "UID:ok-2\nDTSTART:20240602T090000Z",
        ],
    )];
    assert_eq!(labeled_calendar(&feeds, &horizon()).events.len(), 2);
    assert_eq!(busy_calendar(&feeds, &horizon()).events.len(), 2);
}

#[test]
fn test_labeled_sources_stay_independent() {
    let feeds = [
        feed(
            "ICS_URL_A",
            Some("Alice busy"),
            &["UID:a\nDTSTART:20240601T090000Z\nDTEND:20240601T100000Z"],
        ),
        feed(
            "ICS_URL_B",
            Some("Bob busy"),
            &["UID:b\nDTSTART:20240601T093000Z\nDTEND:20240601T103000Z"],
        ),
    ];
    let calendar = labeled_calendar(&feeds, &horizon());
    let summaries: Vec<&str> = calendar
        .events
        .iter()
        .map(|event| value(event, "SUMMARY"))
        .collect();
    assert_eq!(summaries, vec!["Alice busy", "Bob busy"]);
}

#[test]
fn test_zoned_event_is_kept_in_labeled_and_converted_in_busy() {
    let feeds = [feed(
        "ICS_URL_A",
        Some("Alice busy"),
        &["UID:z\nDTSTART;TZID=Europe/Berlin:20240601T090000\nDTEND;TZID=Europe/Berlin:20240601T100000"],
    )];

    let labeled = labeled_calendar(&feeds, &horizon());
    let dtstart = labeled.events[0].get_ical_property("DTSTART").unwrap();
    assert_eq!(dtstart.value.as_deref(), Some("20240601T090000"));
    assert_eq!(dtstart.get_ical_param("TZID"), Some("Europe/Berlin"));

    let busy = busy_calendar(&feeds, &horizon());
    assert_eq!(value(&busy.events[0], "DTSTART"), "20240601T070000Z");
    assert_eq!(value(&busy.events[0], "DTEND"), "20240601T080000Z");
}

#[test]
fn test_all_day_and_timed_events_merge() {
    let feeds = [
        feed(
            "ICS_URL_A",
            None,
            &["UID:a\nDTSTART;VALUE=DATE:20240601\nDTEND;VALUE=DATE:20240602"],
        ),
        feed(
            "ICS_URL_B",
            None,
            &["UID:b\nDTSTART:20240601T230000Z\nDTEND:20240602T010000Z"],
        ),
    ];
    let calendar = busy_calendar(&feeds, &horizon());
    assert_eq!(calendar.events.len(), 1);
    assert_eq!(value(&calendar.events[0], "DTSTART"), "20240601T000000Z");
    assert_eq!(value(&calendar.events[0], "DTEND"), "20240602T010000Z");
}

#[test]
fn test_no_feeds_give_empty_calendars() {
    let labeled = labeled_calendar(&[], &horizon());
    let busy = busy_calendar(&[], &horizon());
    assert!(labeled.events.is_empty());
    assert!(busy.events.is_empty());
    assert!(labeled.generate().contains("END:VCALENDAR"));
    assert!(busy.generate().contains("X-WR-TIMEZONE:UTC"));
}
