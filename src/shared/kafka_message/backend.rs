//! [`Connector`] backed by the `kafka` crate's synchronous client.

use kafka::client::{self as kafka_client, KafkaClient};
use kafka::producer::{Partitioner, Producer, Record, RequiredAcks as KafkaAcks, Topics};
use parking_lot::Mutex;

use crate::shared::config::producer::{ClientConfig, Compression};
use crate::shared::error::BrokerError;
use crate::shared::kafka_message::client::{BrokerClient, Connector, SyncSender};
use crate::shared::kafka_message::message::{Delivery, OutboundRecord};
use crate::shared::kafka_message::partitioner::PartitionSelector;

#[derive(Debug, Clone, Copy, Default)]
pub struct KafkaConnector;

/// Metadata-loaded client. The producer takes the connection over when it is built.
pub struct KafkaBrokerClient {
    client: Mutex<Option<KafkaClient>>,
}

impl BrokerClient for KafkaBrokerClient {
    fn close(&self) -> Result<(), BrokerError> {
        self.client.lock().take();
        Ok(())
    }
}

pub struct KafkaSyncSender {
    producer: Mutex<Option<Producer<KafkaPartitioner>>>,
    return_successes: bool,
}

impl SyncSender for KafkaSyncSender {
    fn send(&self, record: &OutboundRecord) -> Result<Delivery, BrokerError> {
        let mut guard = self.producer.lock();
        let producer = guard.as_mut().ok_or(BrokerError::Closed)?;

        let key: &[u8] = record.key.as_deref().unwrap_or_default();
        let hinted = record.partition.unwrap_or(-1);
        let kafka_record = Record::from_key_value(record.topic.as_str(), key, record.value.as_slice())
            .with_partition(hinted);

        let confirms = producer.send_all(&[kafka_record])?;
        if !self.return_successes || confirms.is_empty() {
            // acks=0: the broker sends nothing back
            return Ok(Delivery {
                partition: hinted,
                offset: -1,
            });
        }

        let confirm = confirms
            .into_iter()
            .flat_map(|confirm| confirm.partition_confirms)
            .next()
            .ok_or_else(|| BrokerError::MissingConfirmation(record.topic.clone()))?;
        let offset = confirm
            .offset
            .map_err(|code| BrokerError::Kafka(format!("{code:?}")))?;

        Ok(Delivery {
            partition: confirm.partition,
            offset,
        })
    }

    fn close(&self) -> Result<(), BrokerError> {
        // Waits for an in-flight send to finish before dropping the connection.
        self.producer.lock().take();
        Ok(())
    }
}

impl Connector for KafkaConnector {
    type Client = KafkaBrokerClient;

    fn connect(
        &self,
        brokers: &[String],
        config: &ClientConfig,
    ) -> Result<KafkaBrokerClient, BrokerError> {
        let mut client = KafkaClient::new(brokers.to_vec());
        client.set_client_id(config.client_id.clone());
        client.load_metadata_all()?;

        Ok(KafkaBrokerClient {
            client: Mutex::new(Some(client)),
        })
    }

    fn producer(
        &self,
        client: &KafkaBrokerClient,
        config: &ClientConfig,
    ) -> Result<Box<dyn SyncSender>, BrokerError> {
        let kafka_client = client.client.lock().take().ok_or(BrokerError::Closed)?;
        let settings = config.producer;

        let producer = Producer::from_client(kafka_client)
            .with_ack_timeout(config.ack_timeout)
            .with_connection_idle_timeout(config.connection_idle_timeout)
            .with_compression(kafka_compression(config.compression))
            .with_required_acks(kafka_acks(settings.native_acks)?)
            .with_partitioner(KafkaPartitioner(PartitionSelector::new(
                settings.partitioner,
            )))
            .create()?;

        Ok(Box::new(KafkaSyncSender {
            producer: Mutex::new(Some(producer)),
            return_successes: settings.return_successes,
        }))
    }
}

fn kafka_acks(native: i16) -> Result<KafkaAcks, BrokerError> {
    match native {
        0 => Ok(KafkaAcks::None),
        1 => Ok(KafkaAcks::One),
        -1 => Ok(KafkaAcks::All),
        other => Err(BrokerError::Other(format!("unsupported acks value {other}"))),
    }
}

fn kafka_compression(compression: Compression) -> kafka_client::Compression {
    match compression {
        Compression::None => kafka_client::Compression::NONE,
        Compression::Gzip => kafka_client::Compression::GZIP,
        Compression::Snappy => kafka_client::Compression::SNAPPY,
    }
}

/// Adapts [`PartitionSelector`] to the client's partitioner hook.
pub struct KafkaPartitioner(PartitionSelector);

impl Partitioner for KafkaPartitioner {
    fn partition(&mut self, topics: Topics<'_>, msg: &mut kafka_client::ProduceMessage<'_, '_>) {
        if msg.partition >= 0 {
            return;
        }
        let Some(partitions) = topics.partitions(msg.topic) else {
            return;
        };
        if let Some(partition) =
            self.0
                .choose(msg.key, partitions.available_ids(), partitions.num_all())
        {
            msg.partition = partition;
        }
    }
}
