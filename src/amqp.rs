//! RabbitMQ plumbing: the schedule job [`Producer`], the queue listener and
//! the exchange/queue declarations both of them rely on.

pub mod listener;
pub mod producer;
pub mod topology;

pub use producer::{Producer, PublishError, PublishedMessage};
