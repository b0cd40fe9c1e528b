pub use sea_orm_migration::prelude::*;

mod m20251001_000001_create_users_and_subscriptions;
mod m20251001_000002_create_birth_details_and_charts;
mod m20251001_000003_create_conversations;
mod m20251001_000004_create_receipts_and_notifications;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251001_000001_create_users_and_subscriptions::Migration),
            Box::new(m20251001_000002_create_birth_details_and_charts::Migration),
            Box::new(m20251001_000003_create_conversations::Migration),
            Box::new(m20251001_000004_create_receipts_and_notifications::Migration),
        ]
    }
}
