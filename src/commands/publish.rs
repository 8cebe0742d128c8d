use std::process;

use sea_orm::{DatabaseConnection, EntityTrait};

use crate::{
    amqp::{Producer, PublishError},
    config::{AmqpConfig, Config},
    database::{models::schedule_job, setup_database_connection},
};

#[derive(Debug, thiserror::Error)]
pub enum PublishCommandError {
    #[error("Schedule job {0} not found")]
    NotFound(i64),
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error(transparent)]
    Publish(#[from] PublishError),
}

pub async fn handle_publish_command(
    config: &Config,
    job_id: i64,
    exchange: Option<&str>,
    routing_key: Option<&str>,
) {
    let db = match setup_database_connection(&config.database).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("❌ Failed to connect to the database: {e}");
            process::exit(1);
        }
    };

    let producer = Producer::amqp(config.amqp.clone());

    if let Err(e) =
        publish_job(&db, &producer, &config.amqp, job_id, exchange, routing_key).await
    {
        eprintln!("❌ {e}");
        process::exit(1);
    }

    println!("✅ Published schedule job {job_id}");
}

/// Loads job `job_id` and sends it, falling back to the configured exchange
/// and routing key.
pub async fn publish_job(
    db: &DatabaseConnection,
    producer: &Producer,
    amqp: &AmqpConfig,
    job_id: i64,
    exchange: Option<&str>,
    routing_key: Option<&str>,
) -> Result<(), PublishCommandError> {
    let job = schedule_job::Entity::find_by_id(job_id)
        .one(db)
        .await?
        .ok_or(PublishCommandError::NotFound(job_id))?;

    match (exchange, routing_key) {
        (None, None) => producer.send_default(amqp, &job).await?,
        (exchange, routing_key) => {
            producer
                .send(
                    exchange.unwrap_or(&amqp.exchange),
                    routing_key.unwrap_or(&amqp.routing_key),
                    &job,
                )
                .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use sea_orm::{ActiveModelTrait, Set};

    use super::*;
    use crate::tests::setup_test;

    #[tokio::test]
    async fn publishes_stored_job() {
        let test = setup_test().await;

        schedule_job::ActiveModel {
            job_id: Set(3),
            job_name: Set(Some("cleanup".to_string())),
            ..Default::default()
        }
        .insert(&test.db)
        .await
        .unwrap();

        publish_job(&test.db, &test.producer, &test.config.amqp, 3, None, Some("other.key"))
            .await
            .unwrap();

        let messages = test.published_messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].exchange, "jsa.direct");
        assert_eq!(messages[0].routing_key, "other.key");
        assert_eq!(messages[0].job().unwrap().job_name.as_deref(), Some("cleanup"));
    }

    #[tokio::test]
    async fn missing_job_is_reported() {
        let test = setup_test().await;

        let result =
            publish_job(&test.db, &test.producer, &test.config.amqp, 404, None, None).await;

        assert!(matches!(result, Err(PublishCommandError::NotFound(404))));
        assert!(test.published_messages().is_empty());
    }
}
