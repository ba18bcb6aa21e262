//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod encoding;
pub mod page_fetcher;
pub mod recurrence;
pub mod scheduled_tasks;
pub mod store;
pub mod test_dependencies;
pub mod traits;

pub use deps::{ServerDeps, SmtpMailerAdapter};
pub use encoding::decode_to_utf8;
pub use page_fetcher::HttpPageFetcher;
pub use recurrence::{Recurrence, ScheduleError};
pub use scheduled_tasks::CronSchedule;
pub use store::PostgresWatchStore;
pub use test_dependencies::TestDependencies;
pub use traits::*;
