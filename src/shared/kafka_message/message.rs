use std::borrow::Cow;
use std::fmt;

use serde_json::Value;

/// A record on its way to the broker.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRecord {
    pub topic: String,
    pub key: Option<Vec<u8>>,
    pub value: Vec<u8>,
    /// Caller data echoed back in the outcome; never sent to the broker.
    pub metadata: Option<Value>,
    /// Partition hint. A producer-wide partition override replaces it.
    pub partition: Option<i32>,
}

impl OutboundRecord {
    pub fn new(topic: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            key: None,
            value: value.into(),
            metadata: None,
            partition: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_partition(mut self, partition: i32) -> Self {
        self.partition = Some(partition);
        self
    }
}

/// Partition and offset the broker assigned to a record.
///
/// Both are -1 when the broker did not report them (for example with
/// `NoResponse` acknowledgements).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub partition: i32,
    pub offset: i64,
}

impl Delivery {
    pub const UNKNOWN: Delivery = Delivery {
        partition: -1,
        offset: -1,
    };
}

/// Outcome of a send: the record as sent plus where it landed.
#[derive(Debug, Clone, PartialEq)]
pub struct ProducerMessage {
    pub topic: String,
    pub key: Option<Vec<u8>>,
    pub value: Vec<u8>,
    pub metadata: Option<Value>,
    pub partition: i32,
    pub offset: i64,
}

impl ProducerMessage {
    pub(crate) fn from_record(record: OutboundRecord, delivery: Delivery) -> Self {
        Self {
            topic: record.topic,
            key: record.key,
            value: record.value,
            metadata: record.metadata,
            partition: delivery.partition,
            offset: delivery.offset,
        }
    }

    pub fn key_lossy(&self) -> Cow<'_, str> {
        match &self.key {
            Some(key) => String::from_utf8_lossy(key),
            None => Cow::Borrowed(""),
        }
    }

    pub fn value_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.value)
    }
}

impl fmt::Display for ProducerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ProducerMessage - Topic: {}, Key: {}, Value: {}, Meta: {}, Offset: {}, Partition: {}",
            self.topic,
            self.key_lossy(),
            self.value_lossy(),
            self.metadata.as_ref().unwrap_or(&Value::Null),
            self.offset,
            self.partition
        )
    }
}
