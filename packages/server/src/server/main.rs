// Main entry point for the page watch server

use std::sync::Arc;

use anyhow::{Context, Result};
use mailer::{MailerOptions, MailerService};
use pagewatch_core::domains::watch_jobs::WatchEngine;
use pagewatch_core::kernel::{
    CronSchedule, HttpPageFetcher, PostgresWatchStore, ServerDeps, SmtpMailerAdapter,
};
use pagewatch_core::{server::build_app, Config};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pagewatch_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting page watch server");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    let smtp_table = config.load_smtp_table()?;
    tracing::info!(smtp_entries = smtp_table.len(), "Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    // Wire the engine
    let schedule = Arc::new(
        CronSchedule::new()
            .await
            .context("Failed to create scheduler")?,
    );
    let fetcher = HttpPageFetcher::new(config.watch.request_timeout, &config.watch.user_agent)
        .context("Failed to create HTTP client")?;
    let mailer = SmtpMailerAdapter::new(Arc::new(MailerService::new(MailerOptions::default())));

    let deps = ServerDeps::new(
        Arc::new(PostgresWatchStore::new(pool.clone())),
        schedule.clone(),
        Arc::new(fetcher),
        Arc::new(mailer),
        Arc::new(smtp_table),
        config.watch.clone(),
    );
    let engine = Arc::new(WatchEngine::new(deps));

    // Register stored jobs, then start firing
    let report = engine
        .sync_from_store()
        .await
        .context("Failed to load jobs")?;
    if !report.skipped.is_empty() {
        tracing::warn!(skipped = report.skipped.len(), "Some jobs could not be scheduled");
    }
    schedule.start().await.context("Failed to start scheduler")?;

    let app = build_app(pool, engine);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await
        .context("Server error")?;

    schedule.shutdown().await.context("Failed to stop scheduler")?;
    Ok(())
}
