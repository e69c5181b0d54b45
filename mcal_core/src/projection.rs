//! Turning normalized spans into output events.
//!
//! The labeled projection keeps every event's shape and swaps its details for
//! a label. The busy projection only ever sees merged intervals, so nothing of
//! the source events survives.

use ical::{
    generator::{IcalEvent, Property},
    ical_param, ical_property,
};
use uuid::Uuid;

use crate::{
    event::{Bounds, Span, DATE_FORMAT, UTC_FORMAT},
    merge::Interval,
    property::GetIcalProperty,
};

pub static BUSY_LABEL: &str = "Busy";
static UID_DOMAIN: &str = "mcal";

/// One source event, republished under its source's label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledEvent {
    pub span: Span,
    pub label: String,
    pub uid: String,
}

impl LabeledEvent {
    pub fn new(source_key: &str, label: &str, event: &IcalEvent, span: Span) -> Self {
        let uid = labeled_uid(source_key, event, &span);
        Self {
            span,
            label: label.to_string(),
            uid,
        }
    }

    /// Build the output event. `stamp` is the run's DTSTAMP in UTC format.
    pub fn to_ical_event(&self, stamp: &str) -> IcalEvent {
        let mut event = IcalEvent::new();
        event.properties.push(ical_property!("UID", self.uid.as_str()));
        event.properties.push(ical_property!("DTSTAMP", stamp));
        event.properties.extend(span_properties(&self.span));
        event
            .properties
            .push(ical_property!("SUMMARY", self.label.as_str()));
        event
    }
}

/// Get a unique id for a labeled event.
///
/// The id is derived from the source and the original event, so it stays the
/// same across runs, but none of the original identifiers can be read from it.
/// Changing this function is a breaking change!
fn labeled_uid(source_key: &str, event: &IcalEvent, span: &Span) -> String {
    let original_uid = event
        .get_ical_property_value("UID")
        .map_or("", String::as_str);
    let recurrence_id = event
        .get_ical_property_value("RECURRENCE-ID")
        .map_or("", String::as_str);
    let interval = span.interval();
    let name = format!(
        "{source_key}\n{original_uid}\n{recurrence_id}\n{}\n{}",
        interval.start().format(UTC_FORMAT),
        interval.end().format(UTC_FORMAT),
    );
    let uuid = Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes());
    format!("{uuid}@{UID_DOMAIN}")
}

/// DTSTART and DTEND in the span's own shape.
fn span_properties(span: &Span) -> [Property; 2] {
    match span.bounds() {
        Bounds::AllDay { start, end } => [
            ical_property!(
                "DTSTART",
                start.format(DATE_FORMAT).to_string(),
                ical_param!("VALUE", "DATE")
            ),
            ical_property!(
                "DTEND",
                end.format(DATE_FORMAT).to_string(),
                ical_param!("VALUE", "DATE")
            ),
        ],
        Bounds::Timed { start, end } => [start.to_property("DTSTART"), end.to_property("DTEND")],
    }
}

/// Build an anonymous busy event for a merged block. Every call gets a fresh UID.
pub fn busy_event(block: &Interval, stamp: &str) -> IcalEvent {
    let mut event = IcalEvent::new();
    event.properties.push(ical_property!(
        "UID",
        format!("{}@{UID_DOMAIN}", Uuid::new_v4())
    ));
    event.properties.push(ical_property!("DTSTAMP", stamp));
    event.properties.push(ical_property!(
        "DTSTART",
        block.start().format(UTC_FORMAT).to_string()
    ));
    event.properties.push(ical_property!(
        "DTEND",
        block.end().format(UTC_FORMAT).to_string()
    ));
    event.properties.push(ical_property!("SUMMARY", BUSY_LABEL));
    event.properties.push(ical_property!("TRANSP", "OPAQUE"));
    event
}
