//! Test fixtures: job inputs, engines over in-memory doubles, and rows.

use anyhow::Result;
use pagewatch_core::domains::accounts::{Account, AccountInput};
use pagewatch_core::domains::watch_jobs::{JobInput, RunStatus, WatchEngine};
use pagewatch_core::kernel::test_dependencies::{InMemoryWatchStore, TestDependencies};
use sqlx::PgPool;
use uuid::Uuid;

pub const WATCHED_URL: &str = "https://shop.example.com/item/1";
pub const SENDER: &str = "watcher@qq.com";

/// A running job watching `value:(\d+)` and mailing SENDER
pub fn job_input(name: &str) -> JobInput {
    JobInput {
        id: None,
        name: name.to_string(),
        cron: "*/5 * * * *".to_string(),
        url: WATCHED_URL.to_string(),
        pattern: r"value:(\d+)".to_string(),
        email: SENDER.to_string(),
        content: "%name% is now %target%".to_string(),
        status: RunStatus::Running,
    }
}

/// Name unlikely to collide on the shared test database
pub fn unique_name(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

/// Engine over in-memory doubles with a sender account for SENDER
pub fn test_engine() -> (TestDependencies, WatchEngine) {
    let deps = TestDependencies::new()
        .mock_store(InMemoryWatchStore::new().with_account(SENDER, "app-token"));
    let engine = WatchEngine::new(deps.clone().into_server_deps());
    (deps, engine)
}

pub async fn create_test_account(pool: &PgPool, email: &str) -> Result<Account> {
    Account::create(
        &AccountInput {
            id: None,
            email: email.to_string(),
            password: "app-token".to_string(),
            host: None,
            port: None,
        },
        pool,
    )
    .await
}
