use std::sync::Arc;

use anyhow::Context;
use crossbeam_utils::sync::WaitGroup;
use parking_lot::RwLock;
use tracing::{info, warn};

use super::Plugin;
use crate::shared::config::producer::ProducerConfig;
use crate::shared::kafka_message::backend::KafkaConnector;
use crate::shared::kafka_message::client::Connector;
use crate::shared::kafka_message::payload::KafkaPayload;
use crate::shared::kafka_message::producer::SyncProducer;
use crate::shared::kafka_message::topics::KafkaTopic;

/// Producer shared between the Kafka plugin and whoever reports on it.
pub type ProducerSlot = Arc<RwLock<Option<Arc<SyncProducer>>>>;

/// Owns one [`SyncProducer`] for the lifetime of the agent.
///
/// Without a config the plugin stays disabled and every hook is a no-op.
pub struct KafkaPlugin<C: Connector = KafkaConnector> {
    agent: String,
    config: Option<ProducerConfig>,
    connector: C,
    wait_group: Option<WaitGroup>,
    slot: ProducerSlot,
    topic: KafkaTopic,
}

impl KafkaPlugin {
    pub fn new(agent: impl Into<String>, config: Option<ProducerConfig>, wait_group: &WaitGroup) -> Self {
        Self::with_connector(agent, config, wait_group, KafkaConnector)
    }
}

impl<C: Connector> KafkaPlugin<C> {
    pub fn with_connector(
        agent: impl Into<String>,
        config: Option<ProducerConfig>,
        wait_group: &WaitGroup,
        connector: C,
    ) -> Self {
        Self {
            agent: agent.into(),
            config,
            connector,
            wait_group: Some(wait_group.clone()),
            slot: ProducerSlot::default(),
            topic: KafkaTopic::default(),
        }
    }

    pub fn with_topic(mut self, topic: KafkaTopic) -> Self {
        self.topic = topic;
        self
    }

    pub fn slot(&self) -> ProducerSlot {
        Arc::clone(&self.slot)
    }

    fn producer(&self) -> Option<Arc<SyncProducer>> {
        self.slot.read().clone()
    }

    fn publish(&self, producer: &SyncProducer, payload: KafkaPayload) -> anyhow::Result<()> {
        let value = payload.to_bytes().context("failed to encode agent event")?;
        let message = producer
            .send_bytes(self.topic.as_str(), b"", &value)
            .context("failed to publish agent event")?;
        info!(
            topic = %message.topic,
            partition = message.partition,
            offset = message.offset,
            "agent event published"
        );
        Ok(())
    }
}

impl<C: Connector + Send> Plugin for KafkaPlugin<C> {
    fn name(&self) -> &'static str {
        "kafka"
    }

    fn init(&mut self) -> anyhow::Result<()> {
        let Some(config) = self.config.take() else {
            // The permit is only held by a live producer.
            self.wait_group = None;
            info!("kafka plugin disabled: no brokers configured");
            return Ok(());
        };

        let wait_group = self.wait_group.take();
        let producer = SyncProducer::with_connector(config, wait_group.as_ref(), &self.connector)
            .context("failed to create sync producer")?;
        info!(brokers = ?producer.config().brokers, "kafka producer connected");
        *self.slot.write() = Some(Arc::new(producer));
        Ok(())
    }

    fn after_init(&mut self) -> anyhow::Result<()> {
        let Some(producer) = self.producer() else {
            return Ok(());
        };
        let started = KafkaPayload::AgentStarted {
            agent: self.agent.clone(),
            plugin: self.name().to_string(),
        };
        if let Err(err) = self.publish(&producer, started) {
            warn!("{err:#}");
        }
        Ok(())
    }

    fn close(&mut self) -> anyhow::Result<()> {
        let Some(producer) = self.producer() else {
            return Ok(());
        };
        if producer.is_closed() {
            return Ok(());
        }

        let stopping = KafkaPayload::AgentStopping {
            agent: self.agent.clone(),
            plugin: self.name().to_string(),
        };
        if let Err(err) = self.publish(&producer, stopping) {
            warn!("{err:#}");
        }
        producer.close().context("failed to close sync producer")
    }
}
