use sea_orm::{entity::prelude::*, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors;
use crate::{direction, user};

/// Join table: user ↔ direction associations.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_direction")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub direction_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    User,
    Direction,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
            Relation::Direction => Entity::belongs_to(direction::Entity)
                .from(Column::DirectionId)
                .to(direction::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn link(
    db: &DatabaseConnection,
    user_id: Uuid,
    direction_id: Uuid,
) -> Result<Model, errors::ModelError> {
    let am = ActiveModel {
        user_id: Set(user_id),
        direction_id: Set(direction_id),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
