use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Template - reusable preset used to pre-fill a new job.
/// Jobs copy the values; nothing links back once created.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: i64,
    pub name: String,
    pub cron: String,
    pub pattern: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateInput {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub cron: String,
    #[serde(default)]
    pub pattern: String,
    #[serde(default)]
    pub content: String,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Template {
    pub async fn create(input: &TemplateInput, pool: &PgPool) -> Result<Self> {
        let template = sqlx::query_as::<_, Template>(
            r#"
            INSERT INTO templates (name, cron, pattern, content)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(&input.cron)
        .bind(&input.pattern)
        .bind(&input.content)
        .fetch_one(pool)
        .await?;
        Ok(template)
    }

    pub async fn find_by_name(name: &str, pool: &PgPool) -> Result<Option<Self>> {
        let template = sqlx::query_as::<_, Template>(
            "SELECT * FROM templates WHERE name = $1 AND deleted_at IS NULL",
        )
        .bind(name)
        .fetch_optional(pool)
        .await?;
        Ok(template)
    }

    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>> {
        let templates = sqlx::query_as::<_, Template>(
            "SELECT * FROM templates WHERE deleted_at IS NULL ORDER BY id",
        )
        .fetch_all(pool)
        .await?;
        Ok(templates)
    }

    pub async fn update(id: i64, input: &TemplateInput, pool: &PgPool) -> Result<Option<Self>> {
        let template = sqlx::query_as::<_, Template>(
            r#"
            UPDATE templates
            SET name = $2,
                cron = $3,
                pattern = $4,
                content = $5,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.cron)
        .bind(&input.pattern)
        .bind(&input.content)
        .fetch_optional(pool)
        .await?;
        Ok(template)
    }

    /// Returns false when no live template had this ID
    pub async fn soft_delete(id: i64, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE templates SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
