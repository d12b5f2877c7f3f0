use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::shared::error::ProducerError;

const FNV32_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV32_PRIME: u32 = 0x0100_0193;

/// Partition selection policy for records that carry no explicit partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionerKind {
    /// FNV-1a of the key modulo the partition count; keyless records go to a random partition.
    #[default]
    Hash,
    /// A random available partition.
    Random,
    /// The record's own partition hint, or partition 0.
    Manual,
    /// Available partitions in turn.
    RoundRobin,
}

impl PartitionerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionerKind::Hash => "hash",
            PartitionerKind::Random => "random",
            PartitionerKind::Manual => "manual",
            PartitionerKind::RoundRobin => "round_robin",
        }
    }
}

impl fmt::Display for PartitionerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PartitionerKind {
    type Err = ProducerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hash" => Ok(PartitionerKind::Hash),
            "random" => Ok(PartitionerKind::Random),
            "manual" => Ok(PartitionerKind::Manual),
            "round_robin" | "round-robin" | "roundrobin" => Ok(PartitionerKind::RoundRobin),
            other => Err(ProducerError::InvalidConfig(format!(
                "unknown partitioner {other:?}"
            ))),
        }
    }
}

/// Stateful partition chooser for one producer.
#[derive(Debug, Clone)]
pub struct PartitionSelector {
    kind: PartitionerKind,
    counter: u32,
}

impl PartitionSelector {
    pub fn new(kind: PartitionerKind) -> Self {
        Self { kind, counter: 0 }
    }

    /// Picks a partition for a record with no partition set.
    ///
    /// `available` lists the partitions that currently have a leader and
    /// `total` is the topic's partition count. Returns `None` when nothing can
    /// be chosen, leaving the decision to the client.
    pub fn choose(&mut self, key: Option<&[u8]>, available: &[i32], total: u32) -> Option<i32> {
        match self.kind {
            PartitionerKind::Hash => match key {
                Some(key) if !key.is_empty() && total > 0 => Some(hash_partition(key, total)),
                _ => random_partition(available),
            },
            PartitionerKind::Random => random_partition(available),
            PartitionerKind::Manual => Some(0),
            PartitionerKind::RoundRobin => {
                if available.is_empty() {
                    return None;
                }
                let partition = available[self.counter as usize % available.len()];
                self.counter = self.counter.wrapping_add(1);
                Some(partition)
            }
        }
    }
}

fn random_partition(available: &[i32]) -> Option<i32> {
    if available.is_empty() {
        return None;
    }
    Some(available[rand::rng().random_range(0..available.len())])
}

/// Same assignment as Sarama's hash partitioner, so keys keep their partitions.
pub fn hash_partition(key: &[u8], total: u32) -> i32 {
    let partition = (fnv1a_32(key) as i32) % (total as i32);
    partition.abs()
}

fn fnv1a_32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV32_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(*byte)).wrapping_mul(FNV32_PRIME)
    })
}
