use tracing::warn;

use crate::shared::config::producer::ClientConfig;
use crate::shared::error::{BrokerError, ProducerError};
use crate::shared::kafka_message::message::{Delivery, OutboundRecord};

/// Connection to the broker cluster.
pub trait BrokerClient: Send + Sync {
    fn close(&self) -> Result<(), BrokerError>;
}

/// Synchronous producer built from a [`BrokerClient`].
///
/// Implementations are shared by every sending thread and must synchronise
/// internally. `send` blocks until the broker answers per the configured acks.
pub trait SyncSender: Send + Sync {
    fn send(&self, record: &OutboundRecord) -> Result<Delivery, BrokerError>;

    fn close(&self) -> Result<(), BrokerError>;
}

/// Opens broker clients and producers. [`KafkaConnector`](super::backend::KafkaConnector)
/// talks to a real cluster; tests plug in doubles.
pub trait Connector {
    type Client: BrokerClient + 'static;

    fn connect(&self, brokers: &[String], config: &ClientConfig)
    -> Result<Self::Client, BrokerError>;

    fn producer(
        &self,
        client: &Self::Client,
        config: &ClientConfig,
    ) -> Result<Box<dyn SyncSender>, BrokerError>;
}

pub(crate) struct Opened {
    pub client: Box<dyn BrokerClient>,
    pub producer: Box<dyn SyncSender>,
}

/// Opens the client, then the producer. If the producer cannot be built the
/// client is closed again before the error is returned.
pub(crate) fn open<C: Connector>(
    connector: &C,
    brokers: &[String],
    config: &ClientConfig,
) -> Result<Opened, ProducerError> {
    let client = connector
        .connect(brokers, config)
        .map_err(ProducerError::BrokerUnavailable)?;

    let producer = match connector.producer(&client, config) {
        Ok(producer) => producer,
        Err(err) => {
            if let Err(close_err) = client.close() {
                warn!("client close error after failed producer setup: {close_err}");
            }
            return Err(ProducerError::BrokerUnavailable(err));
        }
    };

    Ok(Opened {
        client: Box::new(client),
        producer,
    })
}
