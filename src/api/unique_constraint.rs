use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UniqueConstraintError {
    #[error("The value for field '{0}' must be unique.")]
    UniquenessError(&'static str),
    #[error("Database error: {0}")]
    Other(DbErr),
}

/// Maps unique or primary key violations on insert to a uniqueness error for
/// `field_name`. Works the same on Postgres and SQLite.
pub fn handle_unique_constraint_violation(
    field_name: &'static str,
) -> impl Fn(DbErr) -> UniqueConstraintError {
    move |db_err: DbErr| match db_err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            UniqueConstraintError::UniquenessError(field_name)
        }
        _ => UniqueConstraintError::Other(db_err),
    }
}
