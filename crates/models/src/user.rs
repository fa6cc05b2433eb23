use chrono::Utc;
use sea_orm::{entity::prelude::*, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors;

pub const STATUS_NEW: &str = "new";
pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_DELETED: &str = "deleted";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub password_hash: String,
    pub enabled: bool,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_email(email: &str) -> Result<(), errors::ModelError> {
    if !email.contains('@') {
        return Err(errors::ModelError::Validation("invalid email".into()));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), errors::ModelError> {
    if name.trim().is_empty() {
        return Err(errors::ModelError::Validation("name required".into()));
    }
    Ok(())
}

pub fn validate_status(status: &str) -> Result<(), errors::ModelError> {
    match status {
        STATUS_NEW | STATUS_ACTIVE | STATUS_DELETED => Ok(()),
        other => Err(errors::ModelError::Validation(format!(
            "unknown status: {other}"
        ))),
    }
}

/// Insert a new account. Callers decide status and enablement; registration
/// uses `new` + disabled, fixtures use `active` + enabled.
#[allow(clippy::too_many_arguments)]
pub async fn create(
    db: &DatabaseConnection,
    email: &str,
    first_name: &str,
    last_name: Option<&str>,
    password_hash: &str,
    status: &str,
    enabled: bool,
) -> Result<Model, errors::ModelError> {
    validate_email(email)?;
    validate_name(first_name)?;
    validate_status(status)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        first_name: Set(first_name.to_string()),
        last_name: Set(last_name.map(|s| s.to_string())),
        password_hash: Set(password_hash.to_string()),
        enabled: Set(enabled),
        status: Set(status.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn hard_delete(db: &DatabaseConnection, id: Uuid) -> Result<(), errors::ModelError> {
    Entity::delete_by_id(id)
        .exec(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(())
}
