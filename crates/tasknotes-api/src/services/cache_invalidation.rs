//! Event-driven cache invalidation.
//!
//! Subscribes to note and task mutation events on the topic exchange and
//! drops every cached search of the user the event belongs to. Which cached
//! fingerprints a mutation affects is unknowable, so the whole per-user
//! namespace goes.
//!
//! Payloads are JSON objects carrying the owner as `user_id` or, failing
//! that, `sub`:
//!
//! ```json
//! {"user_id": 7, "note_id": "65f0c1"}
//! ```
//!
//! Malformed payloads and events without an owner are acknowledged and
//! dropped. An event whose eviction fails is rejected with requeue, so the
//! broker redelivers it once the cache is reachable again.

use futures::StreamExt;
use lapin::{
    options::{
        BasicAckOptions, BasicConsumeOptions, BasicNackOptions, ExchangeDeclareOptions,
        QueueBindOptions, QueueDeclareOptions,
    },
    types::FieldTable,
    Connection, ConnectionProperties, ExchangeKind,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use tasknotes_core::{defaults, Error, Result};

use crate::auth::user_id_from_json;
use crate::config::EventsConfig;
use crate::services::SearchService;

const CONSUMER_TAG: &str = "search-service";

/// Owner of a mutation event.
///
/// `Ok(None)` means a well-formed event without a usable identity; malformed
/// payloads are an error.
pub fn parse_event_user(payload: &[u8]) -> Result<Option<i32>> {
    let value: Value = serde_json::from_slice(payload)?;
    let Value::Object(fields) = value else {
        return Err(Error::Serialization(
            "event payload is not a JSON object".to_string(),
        ));
    };

    Ok(fields
        .get("user_id")
        .and_then(user_id_from_json)
        .or_else(|| fields.get("sub").and_then(user_id_from_json)))
}

/// Handle for controlling a running subscriber.
pub struct SubscriberHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl SubscriberHandle {
    /// Signal the subscriber to stop and wait for it to finish.
    pub async fn shutdown(self) -> Result<()> {
        // A closed channel means the task already exited.
        let _ = self.shutdown_tx.send(()).await;
        self.task
            .await
            .map_err(|e| Error::Internal(format!("Subscriber task failed: {}", e)))
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Consumes mutation events and invalidates the affected user's cache.
#[derive(Clone)]
pub struct InvalidationSubscriber {
    config: EventsConfig,
    service: SearchService,
}

impl InvalidationSubscriber {
    pub fn new(config: EventsConfig, service: SearchService) -> Self {
        Self { config, service }
    }

    /// Start the subscriber and return a handle for control.
    pub fn start(self) -> SubscriberHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);

        let task = tokio::spawn(async move {
            self.run(&mut shutdown_rx).await;
        });

        SubscriberHandle { shutdown_tx, task }
    }

    /// Apply one event. Returns the number of evicted entries.
    ///
    /// Unusable events are `Ok(0)`. An error means the eviction itself
    /// failed and the event should be retried.
    pub async fn handle_event(&self, routing_key: &str, payload: &[u8]) -> Result<usize> {
        match parse_event_user(payload) {
            Ok(Some(user_id)) => {
                let evicted = self.service.invalidate_user(user_id).await?;
                info!(routing_key, user_id, evicted, "Cache invalidated by event");
                Ok(evicted)
            }
            Ok(None) => {
                debug!(routing_key, "Event without user id, ignoring");
                Ok(0)
            }
            Err(e) => {
                warn!(routing_key, error = %e, "Malformed invalidation event, skipping");
                Ok(0)
            }
        }
    }

    /// Consume until shutdown, reconnecting after failures.
    #[instrument(skip(self, shutdown_rx), fields(exchange = %self.config.exchange, queue = %self.config.queue))]
    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        info!("Cache invalidation subscriber started");

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                result = self.consume() => match result {
                    Ok(()) => warn!("Event stream ended, reconnecting"),
                    Err(e) => error!(error = %e, "Event subscriber failed, reconnecting"),
                },
            }

            tokio::select! {
                _ = shutdown_rx.recv() => break,
                _ = sleep(self.config.retry) => {}
            }
        }

        info!("Cache invalidation subscriber stopped");
    }

    async fn consume(&self) -> Result<()> {
        let connection = Connection::connect(&self.config.url, ConnectionProperties::default())
            .await
            .map_err(bus_error)?;
        let channel = connection.create_channel().await.map_err(bus_error)?;

        channel
            .exchange_declare(
                &self.config.exchange,
                ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(bus_error)?;

        channel
            .queue_declare(
                &self.config.queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(bus_error)?;

        for routing_key in defaults::INVALIDATION_ROUTING_KEYS {
            channel
                .queue_bind(
                    &self.config.queue,
                    &self.config.exchange,
                    routing_key,
                    QueueBindOptions::default(),
                    FieldTable::default(),
                )
                .await
                .map_err(bus_error)?;
        }

        let mut consumer = channel
            .basic_consume(
                &self.config.queue,
                CONSUMER_TAG,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(bus_error)?;

        info!(
            bindings = ?defaults::INVALIDATION_ROUTING_KEYS,
            "Subscribed to mutation events"
        );

        while let Some(delivery) = consumer.next().await {
            let delivery = delivery.map_err(bus_error)?;
            let routing_key = delivery.routing_key.as_str();

            match self.handle_event(routing_key, &delivery.data).await {
                Ok(_) => delivery
                    .ack(BasicAckOptions::default())
                    .await
                    .map_err(bus_error)?,
                Err(e) => {
                    error!(
                        routing_key,
                        error = %e,
                        "Cache invalidation failed, requeueing event"
                    );
                    delivery
                        .nack(BasicNackOptions {
                            requeue: true,
                            ..Default::default()
                        })
                        .await
                        .map_err(bus_error)?;
                    // Redelivery is immediate; give the cache time to recover.
                    sleep(self.config.retry).await;
                }
            }
        }

        Ok(())
    }
}

fn bus_error(e: lapin::Error) -> Error {
    Error::EventBus(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_id_field() {
        assert_eq!(parse_event_user(br#"{"user_id": 7}"#).unwrap(), Some(7));
        assert_eq!(parse_event_user(br#"{"user_id": "7"}"#).unwrap(), Some(7));
    }

    #[test]
    fn test_parse_falls_back_to_sub() {
        assert_eq!(parse_event_user(br#"{"sub": "12"}"#).unwrap(), Some(12));
        assert_eq!(
            parse_event_user(br#"{"user_id": 0, "sub": 12}"#).unwrap(),
            Some(12)
        );
        assert_eq!(
            parse_event_user(br#"{"user_id": 5, "sub": 12}"#).unwrap(),
            Some(5)
        );
    }

    #[test]
    fn test_parse_without_identity() {
        assert_eq!(parse_event_user(br#"{"note_id": "abc"}"#).unwrap(), None);
        assert_eq!(parse_event_user(br#"{"user_id": -1}"#).unwrap(), None);
    }

    #[test]
    fn test_parse_malformed() {
        assert!(parse_event_user(b"not json").is_err());
        assert!(parse_event_user(b"[7]").is_err());
        assert!(parse_event_user(b"7").is_err());
    }
}
