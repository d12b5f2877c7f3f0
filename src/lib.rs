//! Agent plumbing around a synchronous Kafka producer.
//!
//! The [`shared::kafka_message`] module holds the producer core: config
//! validation, acknowledgement mapping, client construction, the
//! [`SyncProducer`] facade and its close lifecycle. The [`agent`] and [`api`]
//! modules hold the small demo agent that the `flags-agent` binary runs.

pub mod agent;
pub mod api;
pub mod shared;

pub use shared::config::producer::{ClientConfig, Compression, ProducerConfig, ProducerSettings};
pub use shared::error::{BrokerError, ProducerError};
pub use shared::kafka_message::acks::RequiredAcks;
pub use shared::kafka_message::message::{Delivery, OutboundRecord, ProducerMessage};
pub use shared::kafka_message::partitioner::PartitionerKind;
pub use shared::kafka_message::producer::SyncProducer;
pub use shared::utils::logger::Logger;
