//! HTTP status surface of the demo agent.

pub mod controller;
pub mod dto;
pub mod service;

use crate::agent::flags::ExampleFlags;
use crate::agent::kafka::ProducerSlot;

/// What the status routes report on.
#[derive(Clone)]
pub struct StatusState {
    pub producer: ProducerSlot,
    pub flags: ExampleFlags,
}
