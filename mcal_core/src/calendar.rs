//! Assembly of the output calendar document.

use ical::{
    generator::{IcalCalendar, IcalCalendarBuilder, IcalEvent, Property},
    ical_property,
};

static PROD_ID: [&str; 2] = ["Team Availability Merge", "mcal"];
static DISPLAY_NAME: &str = "Team Availability";
static DISPLAY_TIMEZONE: &str = "UTC";

/// Which projection produced the events of a calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    Labeled,
    Busy,
}

impl Policy {
    fn label(self) -> &'static str {
        match self {
            Policy::Labeled => "Labeled",
            Policy::Busy => "Busy",
        }
    }

    pub fn display_name(self) -> String {
        format!("{DISPLAY_NAME} ({})", self.label())
    }
}

/// Wrap events into a calendar carrying the document metadata of `policy`.
///
/// Works for an empty event list as well.
pub fn assemble(policy: Policy, events: Vec<IcalEvent>) -> IcalCalendar {
    let mut calendar = IcalCalendarBuilder::version("2.0")
        .gregorian()
        .prodid(prod_id(policy))
        .build();
    let display_name = policy.display_name();
    calendar
        .properties
        .push(ical_property!("NAME", display_name.as_str()));
    calendar
        .properties
        .push(ical_property!("X-WR-CALNAME", display_name.as_str()));
    if policy == Policy::Busy {
        calendar
            .properties
            .push(ical_property!("X-WR-TIMEZONE", DISPLAY_TIMEZONE));
    }
    calendar.events = events;
    calendar
}

fn prod_id(policy: Policy) -> String {
    let mut strings: Vec<String> = Vec::from(PROD_ID).into_iter().map(String::from).collect();
    strings.splice(1..1, [policy.label().to_ascii_lowercase()]);
    strings.splice(0..0, [String::from("-")]);
    strings.join("//")
}

#[cfg(test)]
mod tests {
    use ical::generator::Emitter;

    use super::{assemble, prod_id, Policy};
    use crate::{feed_client::parse, property::GetIcalProperty};

    #[test]
    fn test_prod_id() {
        assert_eq!(
            prod_id(Policy::Labeled),
            "-//Team Availability Merge//labeled//mcal"
        );
        assert_eq!(prod_id(Policy::Busy), "-//Team Availability Merge//busy//mcal");
    }

    #[test]
    fn test_labeled_metadata() {
        let calendar = assemble(Policy::Labeled, vec![]);
        let value = |name: &str| calendar.get_ical_property_value(name).map(String::as_str);
        assert_eq!(value("VERSION"), Some("2.0"));
        assert_eq!(value("NAME"), Some("Team Availability (Labeled)"));
        assert_eq!(value("X-WR-CALNAME"), Some("Team Availability (Labeled)"));
        assert_eq!(value("X-WR-TIMEZONE"), None);
    }

    #[test]
    fn test_busy_metadata() {
        let calendar = assemble(Policy::Busy, vec![]);
        let value = |name: &str| calendar.get_ical_property_value(name).map(String::as_str);
        assert_eq!(value("X-WR-CALNAME"), Some("Team Availability (Busy)"));
        assert_eq!(value("X-WR-TIMEZONE"), Some("UTC"));
    }

    #[test]
    fn test_empty_calendar_is_well_formed() {
        let ics = assemble(Policy::Busy, vec![]).generate();
        assert!(ics.starts_with("BEGIN:VCALENDAR"));
        assert!(ics.trim_end().ends_with("END:VCALENDAR"));
        assert!(parse(&ics).unwrap().is_empty());
    }
}
