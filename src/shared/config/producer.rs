use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::shared::kafka_message::acks::RequiredAcks;
use crate::shared::kafka_message::partitioner::PartitionerKind;
use crate::shared::utils::logger::Logger;
use crate::shared::utils::validator::validate_brokers;

/// Partition override value that leaves partitioning to the partitioner.
pub const NO_PARTITION: i32 = -1;

const DEFAULT_CLIENT_ID: &str = "agent-kafka";
const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECTION_IDLE_TIMEOUT: Duration = Duration::from_secs(540);

/// Configuration of a [`SyncProducer`](crate::SyncProducer).
///
/// `logger` and `partitioner` are optional only so that a missing value can
/// be reported by validation; [`ProducerConfig::new`] fills both.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ProducerConfig {
    #[validate(
        length(min = 1, message = "at least one broker is required"),
        custom(function = "validate_brokers")
    )]
    pub brokers: Vec<String>,
    #[serde(default)]
    pub required_acks: RequiredAcks,
    #[serde(default = "default_partitioner")]
    #[validate(required(message = "partitioner is required"))]
    pub partitioner: Option<PartitionerKind>,
    /// Fixed partition for every record; `-1` disables the override.
    #[serde(default = "default_partition")]
    pub partition: i32,
    #[serde(skip, default = "default_logger")]
    #[validate(required(message = "logger is required"))]
    pub logger: Option<Logger>,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub client: ClientConfig,
}

impl ProducerConfig {
    pub fn new<I, S>(brokers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            brokers: brokers.into_iter().map(Into::into).collect(),
            required_acks: RequiredAcks::Unset,
            partitioner: default_partitioner(),
            partition: NO_PARTITION,
            logger: default_logger(),
            debug: false,
            client: ClientConfig::default(),
        }
    }

    pub fn with_required_acks(mut self, acks: RequiredAcks) -> Self {
        self.required_acks = acks;
        self
    }

    pub fn with_partitioner(mut self, partitioner: PartitionerKind) -> Self {
        self.partitioner = Some(partitioner);
        self
    }

    pub fn with_partition(mut self, partition: i32) -> Self {
        self.partition = partition;
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_client(mut self, client: ClientConfig) -> Self {
        self.client = client;
        self
    }
}

fn default_partitioner() -> Option<PartitionerKind> {
    Some(PartitionerKind::Hash)
}

fn default_partition() -> i32 {
    NO_PARTITION
}

fn default_logger() -> Option<Logger> {
    Some(Logger::default())
}

/// Settings handed to the broker client library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub client_id: String,
    /// How long the broker may take to acknowledge a produce request.
    #[serde(with = "humantime_serde")]
    pub ack_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub connection_idle_timeout: Duration,
    pub compression: Compression,
    /// Filled in by the producer factory from [`ProducerConfig`].
    #[serde(skip)]
    pub producer: ProducerSettings,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_id: DEFAULT_CLIENT_ID.to_string(),
            ack_timeout: DEFAULT_ACK_TIMEOUT,
            connection_idle_timeout: DEFAULT_CONNECTION_IDLE_TIMEOUT,
            compression: Compression::None,
            producer: ProducerSettings::default(),
        }
    }
}

/// Producer-side client settings derived during construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProducerSettings {
    /// Protocol acks value: 0, 1 or -1.
    pub native_acks: i16,
    pub partitioner: PartitionerKind,
    /// Report partition and offset back from every send.
    pub return_successes: bool,
}

impl Default for ProducerSettings {
    fn default() -> Self {
        Self {
            native_acks: 1,
            partitioner: PartitionerKind::Hash,
            return_successes: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    #[default]
    None,
    Gzip,
    Snappy,
}
