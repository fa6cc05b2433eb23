//! Create `user_region` join table with composite primary key.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserRegion::Table)
                    .if_not_exists()
                    .col(uuid(UserRegion::UserId).not_null())
                    .col(uuid(UserRegion::RegionId).not_null())
                    .primary_key(
                        Index::create()
                            .col(UserRegion::UserId)
                            .col(UserRegion::RegionId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_region_user")
                            .from(UserRegion::Table, UserRegion::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_region_region")
                            .from(UserRegion::Table, UserRegion::RegionId)
                            .to(Region::Table, Region::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(UserRegion::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum UserRegion { Table, UserId, RegionId }

#[derive(DeriveIden)]
enum User { Table, Id }

#[derive(DeriveIden)]
enum Region { Table, Id }
