pub use sea_orm_migration::prelude::*;

mod m20250910_081500_create_schedule_job;
mod m20250910_083000_create_user_account;
mod m20250910_090000_create_oauth_token_store;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250910_081500_create_schedule_job::Migration),
            Box::new(m20250910_083000_create_user_account::Migration),
            Box::new(m20250910_090000_create_oauth_token_store::Migration),
        ]
    }
}

pub struct Migrator;
