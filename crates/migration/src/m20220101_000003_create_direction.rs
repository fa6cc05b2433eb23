//! Create `direction` table (specialty tags).
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Direction::Table)
                    .if_not_exists()
                    .col(uuid(Direction::Id).primary_key())
                    .col(string_len(Direction::Name, 128).unique_key().not_null())
                    .col(timestamp_with_time_zone(Direction::CreatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Direction::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Direction { Table, Id, Name, CreatedAt }
