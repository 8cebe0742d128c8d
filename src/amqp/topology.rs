use lapin::{
    options::{ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions},
    types::FieldTable,
    Channel, ExchangeKind,
};
use tracing::debug;

use crate::config::AmqpConfig;

/// Declares the durable direct exchange, the durable queue and the binding
/// between them. Declarations are idempotent so every new channel repeats them.
pub async fn declare_topology(channel: &Channel, config: &AmqpConfig) -> Result<(), lapin::Error> {
    channel
        .exchange_declare(
            &config.exchange,
            ExchangeKind::Direct,
            ExchangeDeclareOptions {
                durable: true,
                ..ExchangeDeclareOptions::default()
            },
            FieldTable::default(),
        )
        .await?;

    channel
        .queue_declare(
            &config.queue,
            QueueDeclareOptions {
                durable: true,
                ..QueueDeclareOptions::default()
            },
            FieldTable::default(),
        )
        .await?;

    channel
        .queue_bind(
            &config.queue,
            &config.exchange,
            &config.routing_key,
            QueueBindOptions::default(),
            FieldTable::default(),
        )
        .await?;

    debug!(
        "Declared exchange {} bound to queue {} with routing key {}",
        config.exchange, config.queue, config.routing_key
    );

    Ok(())
}
