//! Create `user_direction` join table with composite primary key.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserDirection::Table)
                    .if_not_exists()
                    .col(uuid(UserDirection::UserId).not_null())
                    .col(uuid(UserDirection::DirectionId).not_null())
                    .primary_key(
                        Index::create()
                            .col(UserDirection::UserId)
                            .col(UserDirection::DirectionId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_direction_user")
                            .from(UserDirection::Table, UserDirection::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_direction_direction")
                            .from(UserDirection::Table, UserDirection::DirectionId)
                            .to(Direction::Table, Direction::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(UserDirection::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum UserDirection { Table, UserId, DirectionId }

#[derive(DeriveIden)]
enum User { Table, Id }

#[derive(DeriveIden)]
enum Direction { Table, Id }
