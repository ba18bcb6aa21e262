//! Postgres store and record actions against a real database.
//!
//! These start a Postgres container on first use; Docker must be available.

mod common;

use std::sync::Arc;

use common::*;
use mailer::SmtpTable;
use pagewatch_core::common::RecordError;
use pagewatch_core::domains::accounts::{actions as account_actions, AccountInput, PASSWORD_MASK};
use pagewatch_core::domains::templates::{actions as template_actions, TemplateInput};
use pagewatch_core::domains::watch_jobs::{Job, PatternStatus, RunStatus, WatchEngine};
use pagewatch_core::kernel::test_dependencies::{ManualSchedule, MockPageFetcher, RecordingMailer};
use pagewatch_core::kernel::{BaseWatchStore, PostgresWatchStore, ServerDeps};
use pagewatch_core::WatchSettings;
use test_context::test_context;
use uuid::Uuid;

// =============================================================================
// Jobs
// =============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn job_round_trip_keeps_last_value(ctx: &TestHarness) {
    let store = PostgresWatchStore::new(ctx.db_pool.clone());
    let name = unique_name("round-trip");

    let job = store.insert_job(&job_input(&name)).await.unwrap();
    assert_eq!(job.pattern_status(), PatternStatus::Untested);
    assert_eq!(job.last_value, "");

    store.set_job_last_value(job.id, "42").await.unwrap();
    let entry_id = Uuid::new_v4();
    store.set_job_entry_id(job.id, Some(entry_id)).await.unwrap();

    let mut edited = store.find_job(job.id).await.unwrap().unwrap();
    assert_eq!(edited.entry_id, Some(entry_id));
    edited.url = "https://shop.example.com/item/2".to_string();
    edited.last_value = "stale".to_string();
    let updated = store.update_job(&edited).await.unwrap();

    assert_eq!(updated.url, "https://shop.example.com/item/2");
    assert_eq!(updated.last_value, "42", "definition updates never touch the value");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn long_values_and_definitions_are_stored_whole(ctx: &TestHarness) {
    let store = PostgresWatchStore::new(ctx.db_pool.clone());
    let mut input = job_input(&unique_name("long"));
    input.url = format!("https://shop.example.com/search?q={}", "x".repeat(1000));
    input.pattern = format!(r"{}value:(\d+)", "(?:a|b)?".repeat(200));
    input.content = "%name% is now %target%. ".repeat(200);

    let job = store.insert_job(&input).await.unwrap();
    let captured = "9".repeat(5000);
    store.set_job_last_value(job.id, &captured).await.unwrap();

    let stored = store.find_job(job.id).await.unwrap().unwrap();
    assert_eq!(stored.last_value, captured);
    assert_eq!(stored.url, input.url);
    assert_eq!(stored.pattern, input.pattern);
    assert_eq!(stored.content, input.content);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn soft_delete_hides_job_and_frees_name(ctx: &TestHarness) {
    let store = PostgresWatchStore::new(ctx.db_pool.clone());
    let name = unique_name("soft-delete");
    let job = store.insert_job(&job_input(&name)).await.unwrap();
    store
        .set_job_entry_id(job.id, Some(Uuid::new_v4()))
        .await
        .unwrap();

    store.soft_delete_job(job.id).await.unwrap();

    assert!(store.find_job(job.id).await.unwrap().is_none());
    assert!(store.find_job_by_name(&name).await.unwrap().is_none());
    let running: Vec<Job> = store.list_running_jobs().await.unwrap();
    assert!(running.iter().all(|j| j.id != job.id));

    let row: (Option<Uuid>, String) =
        sqlx::query_as("SELECT entry_id, status FROM jobs WHERE id = $1")
            .bind(job.id)
            .fetch_one(&ctx.db_pool)
            .await
            .unwrap();
    assert_eq!(row.0, None);
    assert_eq!(row.1, "stopped");

    let again = store.insert_job(&job_input(&name)).await.unwrap();
    assert_ne!(again.id, job.id);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn hard_delete_removes_row(ctx: &TestHarness) {
    let store = PostgresWatchStore::new(ctx.db_pool.clone());
    let job = store
        .insert_job(&job_input(&unique_name("hard-delete")))
        .await
        .unwrap();

    store.hard_delete_job(job.id).await.unwrap();

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM jobs WHERE id = $1")
        .bind(job.id)
        .fetch_one(&ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(count.0, 0);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn engine_over_postgres_keeps_entry_ids_in_step(ctx: &TestHarness) {
    let schedule = Arc::new(ManualSchedule::new());
    let deps = ServerDeps::new(
        Arc::new(PostgresWatchStore::new(ctx.db_pool.clone())),
        schedule.clone(),
        Arc::new(MockPageFetcher::new()),
        Arc::new(RecordingMailer::new()),
        Arc::new(SmtpTable::builtin()),
        WatchSettings::default(),
    );
    let engine = WatchEngine::new(deps);

    let job = engine.create(job_input(&unique_name("engine"))).await.unwrap();
    let stored = engine.find_job(job.id).await.unwrap();
    assert_eq!(stored.entry_id, job.entry_id);
    assert!(schedule.contains(job.entry_id.unwrap()));

    let paused = engine
        .set_run_status(job.id, RunStatus::Stopped)
        .await
        .unwrap();
    assert_eq!(paused.run_status(), RunStatus::Stopped);
    assert!(engine.find_job(job.id).await.unwrap().entry_id.is_none());
    assert!(!schedule.contains(job.entry_id.unwrap()));

    engine.delete(job.id).await.unwrap();
    assert!(engine.find_job(job.id).await.is_err());
}

// =============================================================================
// Accounts
// =============================================================================

fn account(email: &str, password: &str) -> AccountInput {
    AccountInput {
        id: None,
        email: email.to_string(),
        password: password.to_string(),
        host: None,
        port: None,
    }
}

#[test_context(TestHarness)]
#[tokio::test]
async fn created_account_is_returned_masked(ctx: &TestHarness) {
    let email = format!("{}@qq.com", Uuid::new_v4().simple());

    let created = account_actions::create_account(&account(&email, "app-token"), &ctx.db_pool)
        .await
        .unwrap();

    assert_eq!(created.password, PASSWORD_MASK);
    let listed = account_actions::list_accounts(&ctx.db_pool).await.unwrap();
    let found = listed.iter().find(|a| a.email == email).unwrap();
    assert_eq!(found.password, PASSWORD_MASK);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn duplicate_account_email_is_rejected(ctx: &TestHarness) {
    let email = format!("{}@163.com", Uuid::new_v4().simple());
    create_test_account(&ctx.db_pool, &email).await.unwrap();

    let err = account_actions::create_account(&account(&email, "other"), &ctx.db_pool)
        .await
        .unwrap_err();

    assert!(matches!(err, RecordError::Duplicate { .. }));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn account_update_with_empty_password_keeps_credential(ctx: &TestHarness) {
    let email = format!("{}@qq.com", Uuid::new_v4().simple());
    let created = create_test_account(&ctx.db_pool, &email).await.unwrap();
    let store = PostgresWatchStore::new(ctx.db_pool.clone());

    let mut input = account(&email, "");
    input.id = Some(created.id);
    input.host = Some("relay.local".to_string());
    input.port = Some(2525);
    account_actions::update_account(&input, &ctx.db_pool)
        .await
        .unwrap();

    let stored = store.find_account_by_email(&email).await.unwrap().unwrap();
    assert_eq!(stored.password, "app-token");
    assert_eq!(stored.smtp_host.as_deref(), Some("relay.local"));
    assert_eq!(stored.smtp_port, Some(2525));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn account_without_password_is_rejected(ctx: &TestHarness) {
    let email = format!("{}@qq.com", Uuid::new_v4().simple());

    let err = account_actions::create_account(&account(&email, ""), &ctx.db_pool)
        .await
        .unwrap_err();

    assert!(matches!(err, RecordError::InvalidInput(_)));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn deleting_unknown_account_is_not_found(ctx: &TestHarness) {
    let err = account_actions::delete_account(i64::MAX, &ctx.db_pool)
        .await
        .unwrap_err();
    assert!(matches!(err, RecordError::NotFound { .. }));
}

// =============================================================================
// Templates
// =============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn template_lifecycle(ctx: &TestHarness) {
    let name = unique_name("template");
    let input = TemplateInput {
        id: None,
        name: name.clone(),
        cron: "0 9 * * *".to_string(),
        pattern: r"price:(\d+)".to_string(),
        content: "%name%: %target%".to_string(),
    };

    let created = template_actions::create_template(&input, &ctx.db_pool)
        .await
        .unwrap();
    assert!(matches!(
        template_actions::create_template(&input, &ctx.db_pool).await,
        Err(RecordError::Duplicate { .. })
    ));

    let mut edit = input.clone();
    edit.id = Some(created.id);
    edit.cron = "@hourly".to_string();
    let updated = template_actions::update_template(&edit, &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(updated.cron, "@hourly");

    template_actions::delete_template(created.id, &ctx.db_pool)
        .await
        .unwrap();
    let listed = template_actions::list_templates(&ctx.db_pool).await.unwrap();
    assert!(listed.iter().all(|t| t.id != created.id));
}
