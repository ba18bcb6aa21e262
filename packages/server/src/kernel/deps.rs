//! Server dependencies for the watch engine (using traits for testability)
//!
//! This module provides the central dependency container handed to the engine,
//! the pipeline and the probes. All external services use trait abstractions
//! so tests can run against the doubles in `test_dependencies`.

use async_trait::async_trait;
use mailer::{MailerError, MailerService, OutgoingEmail, SmtpCredentials, SmtpTable, SmtpTarget};
use std::sync::Arc;

use crate::config::WatchSettings;
use crate::kernel::{BaseMailer, BasePageFetcher, BaseSchedule, BaseWatchStore};

// =============================================================================
// MailerService Adapter (implements BaseMailer trait)
// =============================================================================

/// Wrapper around MailerService that implements BaseMailer trait
pub struct SmtpMailerAdapter(pub Arc<MailerService>);

impl SmtpMailerAdapter {
    pub fn new(service: Arc<MailerService>) -> Self {
        Self(service)
    }
}

#[async_trait]
impl BaseMailer for SmtpMailerAdapter {
    async fn send(
        &self,
        target: &SmtpTarget,
        credentials: &SmtpCredentials,
        email: &OutgoingEmail,
    ) -> Result<(), MailerError> {
        self.0.send(target, credentials, email).await
    }

    async fn verify(
        &self,
        target: &SmtpTarget,
        credentials: &SmtpCredentials,
    ) -> Result<(), MailerError> {
        self.0.verify(target, credentials).await
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Dependencies shared by the engine, every pipeline run and the probes
#[derive(Clone)]
pub struct ServerDeps {
    pub store: Arc<dyn BaseWatchStore>,
    pub schedule: Arc<dyn BaseSchedule>,
    pub fetcher: Arc<dyn BasePageFetcher>,
    pub mailer: Arc<dyn BaseMailer>,
    pub smtp_table: Arc<SmtpTable>,
    pub settings: WatchSettings,
}

impl ServerDeps {
    pub fn new(
        store: Arc<dyn BaseWatchStore>,
        schedule: Arc<dyn BaseSchedule>,
        fetcher: Arc<dyn BasePageFetcher>,
        mailer: Arc<dyn BaseMailer>,
        smtp_table: Arc<SmtpTable>,
        settings: WatchSettings,
    ) -> Self {
        Self {
            store,
            schedule,
            fetcher,
            mailer,
            smtp_table,
            settings,
        }
    }
}
