pub mod announce;
pub mod schedule;
