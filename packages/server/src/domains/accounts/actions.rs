//! Account actions - business logic functions
//!
//! Accounts are plain records; nothing here touches the schedule.

use sqlx::PgPool;
use tracing::info;

use crate::common::RecordError;
use crate::domains::accounts::models::{Account, AccountInput};

const KIND: &str = "Account";

fn validate(input: &AccountInput) -> Result<(), RecordError> {
    if input.email.trim().is_empty() {
        return Err(RecordError::InvalidInput("email is required".to_string()));
    }
    if !input.email.contains('@') {
        return Err(RecordError::InvalidInput(format!(
            "`{}` is not an email address",
            input.email
        )));
    }
    Ok(())
}

pub async fn create_account(input: &AccountInput, pool: &PgPool) -> Result<Account, RecordError> {
    validate(input)?;
    if input.password.is_empty() {
        return Err(RecordError::InvalidInput("password is required".to_string()));
    }
    if Account::find_by_email(&input.email, pool).await?.is_some() {
        return Err(RecordError::Duplicate {
            kind: KIND,
            key: input.email.clone(),
        });
    }

    let account = Account::create(input, pool).await?;
    info!(account_id = account.id, email = %account.email, "Account created");
    Ok(account.masked())
}

/// Update an account. An empty password keeps the stored credential.
pub async fn update_account(input: &AccountInput, pool: &PgPool) -> Result<Account, RecordError> {
    let id = input
        .id
        .ok_or_else(|| RecordError::InvalidInput("id is required".to_string()))?;
    validate(input)?;

    if let Some(other) = Account::find_by_email(&input.email, pool).await? {
        if other.id != id {
            return Err(RecordError::Duplicate {
                kind: KIND,
                key: input.email.clone(),
            });
        }
    }

    let account = Account::update(id, input, pool)
        .await?
        .ok_or(RecordError::NotFound { kind: KIND, id })?;
    info!(account_id = id, "Account updated");
    Ok(account.masked())
}

pub async fn delete_account(id: i64, pool: &PgPool) -> Result<(), RecordError> {
    if !Account::soft_delete(id, pool).await? {
        return Err(RecordError::NotFound { kind: KIND, id });
    }
    info!(account_id = id, "Account deleted");
    Ok(())
}

/// All live accounts with credentials masked
pub async fn list_accounts(pool: &PgPool) -> Result<Vec<Account>, RecordError> {
    let accounts = Account::find_all(pool).await?;
    Ok(accounts.into_iter().map(Account::masked).collect())
}
