// Page Watch - API Core
//
// Periodically re-fetches web pages, extracts a value from each with a
// regular expression and emails the owner when the value changes.
// Jobs live in Postgres; their timers live in an in-process cron schedule.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
