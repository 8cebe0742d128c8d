use std::borrow::Cow;

use futures_util::StreamExt as _;
use lapin::{
    options::{BasicAckOptions, BasicConsumeOptions},
    types::FieldTable,
    Connection, ConnectionProperties,
};
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

use crate::{amqp::topology::declare_topology, config::AmqpConfig};

const CONSUMER_TAG: &str = "squeezer-listener";

/// Consumes the configured queue forever, reconnecting after failures.
pub async fn start_listener(config: AmqpConfig) {
    let delay = Duration::from_secs(config.reconnect_delay_seconds);

    loop {
        if let Err(e) = listen_loop(&config).await {
            error!(
                "Queue listener error: {}, restarting in {}s...",
                e,
                delay.as_secs()
            );
        } else {
            warn!("Queue listener consumer was cancelled, restarting...");
        }
        sleep(delay).await;
    }
}

async fn listen_loop(config: &AmqpConfig) -> Result<(), lapin::Error> {
    let connection = Connection::connect(&config.url, ConnectionProperties::default()).await?;
    let channel = connection.create_channel().await?;

    if config.declare_topology {
        declare_topology(&channel, config).await?;
    }

    let mut consumer = channel
        .basic_consume(
            &config.queue,
            CONSUMER_TAG,
            BasicConsumeOptions::default(),
            FieldTable::default(),
        )
        .await?;

    info!("Queue listener started, consuming from '{}'", config.queue);

    while let Some(delivery) = consumer.next().await {
        let delivery = delivery?;
        receive(&delivery.data);
        delivery.ack(BasicAckOptions::default()).await?;
    }

    Ok(())
}

/// Handles one delivery. The payload is only logged.
pub fn receive(payload: &[u8]) {
    info!("{}", decode_payload(payload));
}

#[must_use]
pub fn decode_payload(payload: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(payload)
}
