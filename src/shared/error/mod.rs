use serde::Serialize;
use thiserror::Error;

use crate::shared::kafka_message::message::ProducerMessage;

pub mod handlers;

/// Errors surfaced by [`SyncProducer`](crate::SyncProducer) construction, sends and close.
#[derive(Error, Debug)]
pub enum ProducerError {
    #[error("invalid producer config: {0}")]
    InvalidConfig(String),
    #[error("invalid RequiredAcks field in config: {0}")]
    InvalidAcks(String),
    #[error("broker unavailable: {0}")]
    BrokerUnavailable(#[source] BrokerError),
    #[error("nil message can not be sent")]
    EmptyPayload,
    #[error("message error for topic {}: {source}", .message.topic)]
    SendFailed {
        /// Outcome as far as it got; partition and offset are -1 when the broker never assigned them.
        message: Box<ProducerMessage>,
        #[source]
        source: BrokerError,
    },
    #[error("sync producer close error: {0}")]
    CloseFailed(#[source] BrokerError),
}

impl ProducerError {
    /// The partially populated outcome of a failed send, if this is one.
    pub fn message(&self) -> Option<&ProducerMessage> {
        match self {
            ProducerError::SendFailed { message, .. } => Some(&**message),
            _ => None,
        }
    }
}

impl From<validator::ValidationErrors> for ProducerError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ProducerError::InvalidConfig(errors.to_string())
    }
}

/// Errors reported by a broker client or producer backend.
#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("kafka error: {0}")]
    Kafka(String),
    #[error("producer is closed")]
    Closed,
    #[error("no partition confirmation received for topic {0}")]
    MissingConfirmation(String),
    #[error("{0}")]
    Other(String),
}

impl From<kafka::Error> for BrokerError {
    fn from(err: kafka::Error) -> Self {
        BrokerError::Kafka(err.to_string())
    }
}

#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub message: String,
    pub code: Option<String>,
    pub status: u16,
}
