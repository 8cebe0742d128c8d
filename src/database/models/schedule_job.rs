//! `SeaORM` Entity for schedule job records

use std::fmt::{self, Display, Formatter};

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A job-scheduling record.
///
/// `job_id` is assigned by the caller, never generated. `cron_expression` is
/// stored as opaque text and left to whichever scheduler consumes the record.
#[derive(Clone, Debug, Default, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "schedule_job")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub job_id: i64,
    pub job_name: Option<String>,
    pub job_group: Option<String>,
    pub job_status: Option<String>,
    pub cron_expression: Option<String>,
    pub description: Option<String>,
    pub interface_name: Option<String>,
}

pub type ScheduleJob = Model;

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    #[must_use]
    pub fn new(job_id: i64) -> Self {
        Self {
            job_id,
            ..Self::default()
        }
    }
}

struct OrNull<'a>(&'a Option<String>);

impl Display for OrNull<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => f.write_str(value),
            None => f.write_str("null"),
        }
    }
}

impl Display for Model {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ScheduleJob [jobId={}, jobName={}, jobGroup={}, jobStatus={}, cronExpression={}, description={}, interfaceName={}]",
            self.job_id,
            OrNull(&self.job_name),
            OrNull(&self.job_group),
            OrNull(&self.job_status),
            OrNull(&self.cron_expression),
            OrNull(&self.description),
            OrNull(&self.interface_name),
        )
    }
}
