use std::env;
use std::time::Duration;

use crate::shared::config::producer::{Compression, ProducerConfig};
use crate::shared::error::ProducerError;
use crate::shared::kafka_message::acks::RequiredAcks;
use crate::shared::kafka_message::partitioner::PartitionerKind;

impl ProducerConfig {
    /// Builds a config from `KAFKA_*` environment variables.
    ///
    /// Returns `Ok(None)` when `KAFKA_BROKERS` is not set.
    pub fn from_env() -> Result<Option<Self>, ProducerError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Option<Self>, ProducerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(brokers) = lookup("KAFKA_BROKERS") else {
            return Ok(None);
        };
        let brokers = brokers
            .split(',')
            .map(str::trim)
            .filter(|broker| !broker.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();

        let mut config = ProducerConfig::new(brokers);

        if let Some(acks) = lookup("KAFKA_REQUIRED_ACKS") {
            config.required_acks = acks.parse::<RequiredAcks>()?;
        }
        if let Some(partitioner) = lookup("KAFKA_PARTITIONER") {
            config.partitioner = Some(partitioner.parse::<PartitionerKind>()?);
        }
        if let Some(partition) = lookup("KAFKA_PARTITION") {
            config.partition = partition.trim().parse().map_err(|_| {
                ProducerError::InvalidConfig(format!("invalid KAFKA_PARTITION: {partition:?}"))
            })?;
        }
        if let Some(debug) = lookup("KAFKA_DEBUG") {
            config.debug = parse_bool(&debug).ok_or_else(|| {
                ProducerError::InvalidConfig(format!("invalid KAFKA_DEBUG: {debug:?}"))
            })?;
        }
        if let Some(client_id) = lookup("KAFKA_CLIENT_ID") {
            config.client.client_id = client_id;
        }
        if let Some(timeout) = lookup("KAFKA_ACK_TIMEOUT_MS") {
            let millis: u64 = timeout.trim().parse().map_err(|_| {
                ProducerError::InvalidConfig(format!("invalid KAFKA_ACK_TIMEOUT_MS: {timeout:?}"))
            })?;
            config.client.ack_timeout = Duration::from_millis(millis);
        }
        if let Some(compression) = lookup("KAFKA_COMPRESSION") {
            config.client.compression = match compression.trim().to_ascii_lowercase().as_str() {
                "none" | "" => Compression::None,
                "gzip" => Compression::Gzip,
                "snappy" => Compression::Snappy,
                other => {
                    return Err(ProducerError::InvalidConfig(format!(
                        "unsupported KAFKA_COMPRESSION: {other:?}"
                    )));
                }
            };
        }

        Ok(Some(config))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
