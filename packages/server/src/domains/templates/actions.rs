use sqlx::PgPool;
use tracing::info;

use crate::common::RecordError;
use crate::domains::templates::models::{Template, TemplateInput};

const KIND: &str = "Template";

fn validate(input: &TemplateInput) -> Result<(), RecordError> {
    if input.name.trim().is_empty() {
        return Err(RecordError::InvalidInput("name is required".to_string()));
    }
    Ok(())
}

pub async fn create_template(input: &TemplateInput, pool: &PgPool) -> Result<Template, RecordError> {
    validate(input)?;
    if Template::find_by_name(&input.name, pool).await?.is_some() {
        return Err(RecordError::Duplicate {
            kind: KIND,
            key: input.name.clone(),
        });
    }

    let template = Template::create(input, pool).await?;
    info!(template_id = template.id, name = %template.name, "Template created");
    Ok(template)
}

pub async fn update_template(input: &TemplateInput, pool: &PgPool) -> Result<Template, RecordError> {
    let id = input
        .id
        .ok_or_else(|| RecordError::InvalidInput("id is required".to_string()))?;
    validate(input)?;

    if let Some(other) = Template::find_by_name(&input.name, pool).await? {
        if other.id != id {
            return Err(RecordError::Duplicate {
                kind: KIND,
                key: input.name.clone(),
            });
        }
    }

    Template::update(id, input, pool)
        .await?
        .ok_or(RecordError::NotFound { kind: KIND, id })
}

pub async fn delete_template(id: i64, pool: &PgPool) -> Result<(), RecordError> {
    if !Template::soft_delete(id, pool).await? {
        return Err(RecordError::NotFound { kind: KIND, id });
    }
    info!(template_id = id, "Template deleted");
    Ok(())
}

pub async fn list_templates(pool: &PgPool) -> Result<Vec<Template>, RecordError> {
    Ok(Template::find_all(pool).await?)
}
