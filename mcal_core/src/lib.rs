//! This crate merges several iCalendar feeds into a single calendar.
//!
//! Two runs are available:
//!
//! - [`pipeline::run_labeled`] republishes every upcoming event of every feed,
//!   with its summary replaced by the feed's label.
//! - [`pipeline::run_busy`] pools the upcoming events of all feeds and merges
//!   them into anonymous "Busy" blocks, discarding everything else.
//!
//! Events are normalized by [`event::normalize`], filtered against a
//! [`horizon::Horizon`] and, for busy calendars, coalesced by [`merge::merge`].

pub use ical;

pub mod calendar;
pub mod config;
pub mod error;
pub mod event;
pub mod feed_client;
pub mod horizon;
pub mod merge;
pub mod pipeline;
pub mod projection;
pub mod property;
