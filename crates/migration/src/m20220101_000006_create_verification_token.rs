//! Create `verification_token` table with FK to `user`.
//!
//! One token row per pending verification; consumed by the account
//! enablement flow.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VerificationToken::Table)
                    .if_not_exists()
                    .col(uuid(VerificationToken::Id).primary_key())
                    .col(string_len(VerificationToken::Token, 255).unique_key().not_null())
                    .col(uuid(VerificationToken::UserId).not_null())
                    .col(timestamp_with_time_zone(VerificationToken::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_verification_token_user")
                            .from(VerificationToken::Table, VerificationToken::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(VerificationToken::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum VerificationToken { Table, Id, Token, UserId, CreatedAt }

#[derive(DeriveIden)]
enum User { Table, Id }
