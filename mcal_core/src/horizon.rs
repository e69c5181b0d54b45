//! The forward-looking window events must overlap to be exported.

use chrono::{DateTime, Duration, Utc};

use crate::{event::Span, merge::Interval};

pub const DEFAULT_HORIZON_DAYS: u32 = 120;

/// The half-open window `[now, now + days)`.
///
/// Built once per run; every event of every feed is checked against the same
/// bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Horizon {
    now: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Horizon {
    pub fn new(now: DateTime<Utc>, days: u32) -> Self {
        let end = now
            .checked_add_signed(Duration::days(i64::from(days)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self { now, end }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn overlaps(&self, interval: &Interval) -> bool {
        interval.end() > self.now && interval.start() < self.end
    }

    pub fn keeps(&self, span: &Span) -> bool {
        self.overlaps(&span.interval())
    }
}
