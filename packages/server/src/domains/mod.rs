// Business domains
pub mod accounts;
pub mod templates;
pub mod watch_jobs;
