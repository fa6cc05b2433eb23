//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20220101_000001_create_user;
mod m20220101_000002_create_region;
mod m20220101_000003_create_direction;
mod m20220101_000004_create_user_region;
mod m20220101_000005_create_user_direction;
mod m20220101_000006_create_verification_token;
mod m20220101_000007_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20220101_000001_create_user::Migration),
            Box::new(m20220101_000002_create_region::Migration),
            Box::new(m20220101_000003_create_direction::Migration),
            Box::new(m20220101_000004_create_user_region::Migration),
            Box::new(m20220101_000005_create_user_direction::Migration),
            Box::new(m20220101_000006_create_verification_token::Migration),
            // Indexes should always be applied last
            Box::new(m20220101_000007_add_indexes::Migration),
        ]
    }
}
