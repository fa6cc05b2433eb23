//! Secondary indexes for the hot query paths: expert-profile filtering by
//! status/enablement, name search, and tag lookups from the join tables.
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_user_status_enabled")
                    .table(User::Table)
                    .col(User::Status)
                    .col(User::Enabled)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_user_first_last_name")
                    .table(User::Table)
                    .col(User::FirstName)
                    .col(User::LastName)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_user_region_region")
                    .table(UserRegion::Table)
                    .col(UserRegion::RegionId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_user_direction_direction")
                    .table(UserDirection::Table)
                    .col(UserDirection::DirectionId)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_user_status_enabled").table(User::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_user_first_last_name").table(User::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_user_region_region").table(UserRegion::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_user_direction_direction").table(UserDirection::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum User { Table, Status, Enabled, FirstName, LastName }

#[derive(DeriveIden)]
enum UserRegion { Table, RegionId }

#[derive(DeriveIden)]
enum UserDirection { Table, DirectionId }
