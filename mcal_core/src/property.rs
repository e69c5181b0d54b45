//! Lookup helpers for parsed iCalendar components.

use ical::generator::{IcalCalendar, IcalEvent, Property};

pub trait GetIcalProperty {
    fn get_ical_property(&self, name: &str) -> Option<&Property>;

    fn get_ical_property_value(&self, name: &str) -> Option<&String> {
        self.get_ical_property(name)
            .and_then(|property| property.value.as_ref())
    }
}

fn find_property<'a>(properties: &'a [Property], name: &str) -> Option<&'a Property> {
    properties
        .iter()
        .find(|property| property.name.eq_ignore_ascii_case(name))
}

impl GetIcalProperty for IcalEvent {
    fn get_ical_property(&self, name: &str) -> Option<&Property> {
        find_property(&self.properties, name)
    }
}

impl GetIcalProperty for IcalCalendar {
    fn get_ical_property(&self, name: &str) -> Option<&Property> {
        find_property(&self.properties, name)
    }
}

pub trait GetIcalParam {
    /// The first value of the named parameter, without surrounding quotes.
    fn get_ical_param(&self, name: &str) -> Option<&str>;
}

impl GetIcalParam for Property {
    fn get_ical_param(&self, name: &str) -> Option<&str> {
        self.params
            .as_ref()?
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .and_then(|(_, values)| values.first())
            .map(|value| value.trim_matches('"'))
    }
}
