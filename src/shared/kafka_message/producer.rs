use std::time::Duration;

use crossbeam_channel::Receiver;
use crossbeam_utils::sync::WaitGroup;
use serde_json::Value;
use tracing::{Level, debug, error};

use super::acks::native_acks;
use super::backend::KafkaConnector;
use super::client::{self, BrokerClient, Connector, Opened, SyncSender};
use super::lifecycle::Lifecycle;
use super::message::{Delivery, OutboundRecord, ProducerMessage};
use crate::shared::config::producer::ProducerConfig;
use crate::shared::error::ProducerError;
use crate::shared::utils::hash::derive_key;
use crate::shared::utils::logger::Logger;
use crate::shared::utils::validator::validate_producer_config;

/// Publishes messages to Kafka and waits for each one to be acknowledged.
///
/// The handle is `Send + Sync`; share it with `Arc` and send from as many
/// threads as needed. [`close`](SyncProducer::close) shuts the producer and
/// client down exactly once and wakes everything waiting on the close signal.
pub struct SyncProducer {
    logger: Logger,
    config: ProducerConfig,
    client: Box<dyn BrokerClient>,
    producer: Box<dyn SyncSender>,
    partition: i32,
    lifecycle: Lifecycle,
}

impl SyncProducer {
    /// Connects to the brokers in `config`.
    ///
    /// When `wait_group` is given the producer holds one of its permits until
    /// it is closed.
    pub fn new(config: ProducerConfig, wait_group: Option<&WaitGroup>) -> Result<Self, ProducerError> {
        Self::with_connector(config, wait_group, &KafkaConnector)
    }

    pub fn with_connector<C: Connector>(
        mut config: ProducerConfig,
        wait_group: Option<&WaitGroup>,
        connector: &C,
    ) -> Result<Self, ProducerError> {
        validate_producer_config(&mut config)?;
        let logger = config.logger.clone().unwrap_or_default();
        if logger.enabled(Level::DEBUG) {
            debug!(logger = logger.name(), "entering SyncProducer::new ...");
        }

        let settings = &mut config.client.producer;
        settings.native_acks = native_acks(config.required_acks)?;
        settings.partitioner = config.partitioner.unwrap_or_default();
        settings.return_successes = true;

        if logger.enabled(Level::DEBUG) {
            debug!(logger = logger.name(), "SyncProducer config: {config:?}");
        }

        let Opened { client, producer } = client::open(connector, &config.brokers, &config.client)?;

        Ok(Self {
            partition: config.partition,
            logger,
            config,
            client,
            producer,
            lifecycle: Lifecycle::new(wait_group),
        })
    }

    /// Effective configuration, after defaults were applied.
    pub fn config(&self) -> &ProducerConfig {
        &self.config
    }

    /// Sends `value` keyed by `key`; an empty key is replaced by the hex MD5 of the value.
    pub fn send_bytes(&self, topic: &str, key: &[u8], value: &[u8]) -> Result<ProducerMessage, ProducerError> {
        if self.logger.enabled(Level::DEBUG) {
            debug!(
                logger = self.logger.name(),
                topic,
                key = %String::from_utf8_lossy(key),
                "Sending"
            );
        }

        if key.is_empty() {
            let derived = derive_key(value);
            return self.send_message(topic, Some(derived.as_bytes()), Some(value), None);
        }
        self.send_message(topic, Some(key), Some(value), None)
    }

    /// Sends one message and waits for the broker's answer.
    ///
    /// A `None` value is rejected before anything reaches the broker. On a
    /// broker failure the returned [`ProducerError::SendFailed`] carries the
    /// message as far as it got.
    pub fn send_message(
        &self,
        topic: &str,
        key: Option<&[u8]>,
        value: Option<&[u8]>,
        metadata: Option<Value>,
    ) -> Result<ProducerMessage, ProducerError> {
        let Some(value) = value else {
            let err = ProducerError::EmptyPayload;
            if self.logger.enabled(Level::ERROR) {
                error!(
                    logger = self.logger.name(),
                    topic,
                    key = %String::from_utf8_lossy(key.unwrap_or_default()),
                    "{err}"
                );
            }
            return Err(err);
        };

        let mut record = OutboundRecord::new(topic, value);
        record.key = key.map(<[u8]>::to_vec);
        record.metadata = metadata;
        self.send_record(record)
    }

    /// Sends a prepared record. A partition override in the config replaces the record's hint.
    pub fn send_record(&self, mut record: OutboundRecord) -> Result<ProducerMessage, ProducerError> {
        if self.partition > -1 {
            record.partition = Some(self.partition);
        }

        match self.producer.send(&record) {
            Ok(delivery) => {
                let message = ProducerMessage::from_record(record, delivery);
                if self.logger.enabled(Level::DEBUG) {
                    debug!(
                        logger = self.logger.name(),
                        topic = %message.topic,
                        key = %message.key_lossy(),
                        partition = message.partition,
                        offset = message.offset,
                        "message sent: {message}"
                    );
                }
                Ok(message)
            }
            Err(source) => {
                let message = ProducerMessage::from_record(record, Delivery::UNKNOWN);
                if self.logger.enabled(Level::ERROR) {
                    error!(
                        logger = self.logger.name(),
                        topic = %message.topic,
                        key = %message.key_lossy(),
                        "message error: {message}, err: {source}"
                    );
                }
                Err(ProducerError::SendFailed {
                    message: Box::new(message),
                    source,
                })
            }
        }
    }

    /// Closes the producer, then the client.
    ///
    /// Only the first call does anything; it marks the handle closed, fires
    /// the close signal and releases the wait-group permit even when one of
    /// the underlying closes fails. Later calls return `Ok(())`.
    pub fn close(&self) -> Result<(), ProducerError> {
        self.lifecycle.close_with(|| {
            if let Err(err) = self.producer.close() {
                if self.logger.enabled(Level::ERROR) {
                    error!(logger = self.logger.name(), "SyncProducer close error: {err}");
                }
                return Err(ProducerError::CloseFailed(err));
            }
            if self.logger.enabled(Level::DEBUG) {
                debug!(logger = self.logger.name(), "SyncProducer closed");
            }

            if let Err(err) = self.client.close() {
                if self.logger.enabled(Level::ERROR) {
                    error!(logger = self.logger.name(), "client close error: {err}");
                }
                return Err(ProducerError::CloseFailed(err));
            }
            Ok(())
        })
    }

    pub fn is_closed(&self) -> bool {
        self.lifecycle.is_closed()
    }

    /// Blocks until [`close`](SyncProducer::close) has run.
    pub fn wait_for_close(&self) {
        self.lifecycle.wait()
    }

    /// Like [`wait_for_close`](SyncProducer::wait_for_close) but gives up after
    /// `timeout`; returns whether the producer is closed.
    pub fn wait_for_close_timeout(&self, timeout: Duration) -> bool {
        self.lifecycle.wait_timeout(timeout)
    }

    /// Receiver that disconnects when the producer closes, for use in
    /// `crossbeam_channel::select!` alongside other sources.
    pub fn close_signal(&self) -> Receiver<()> {
        self.lifecycle.signal()
    }
}
