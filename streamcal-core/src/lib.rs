//! Core of streamcal.
//!
//! This crate provides everything except the network and platform glue:
//! - `schedule` turns an ICS feed into a `ScheduleDocument` of upcoming streams
//! - `announcer` picks the next stream from a schedule and posts it exactly once
//!
//! Fetching, publishing and state storage come in through the traits in
//! `announcer` and `state`, so the binary supplies the real ones and tests
//! supply doubles.

pub mod announcer;
pub mod date_range;
pub mod error;
pub mod event;
pub mod ics;
pub mod message;
pub mod recurrence;
pub mod schedule;
pub mod selection;
pub mod state;
pub mod title;

pub use error::{Error, Result};
