//! ICS feed parsing.
//!
//! Reads an RFC 5545 calendar into `CalendarEvent`s. Only the properties the
//! schedule needs are kept.

mod parse;

pub use parse::parse_calendar;
