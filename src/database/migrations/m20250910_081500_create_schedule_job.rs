use sea_orm_migration::{
    prelude::*,
    schema::{big_integer, string_null},
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // job_id is assigned by callers, so no sequence behind it
        manager
            .create_table(
                Table::create()
                    .table(ScheduleJob::Table)
                    .if_not_exists()
                    .col(big_integer(ScheduleJob::JobId).primary_key())
                    .col(string_null(ScheduleJob::JobName))
                    .col(string_null(ScheduleJob::JobGroup))
                    .col(string_null(ScheduleJob::JobStatus))
                    .col(string_null(ScheduleJob::CronExpression))
                    .col(string_null(ScheduleJob::Description))
                    .col(string_null(ScheduleJob::InterfaceName))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ScheduleJob::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ScheduleJob {
    Table,
    JobId,
    JobName,
    JobGroup,
    JobStatus,
    CronExpression,
    Description,
    InterfaceName,
}
