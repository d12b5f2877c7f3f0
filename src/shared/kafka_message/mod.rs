pub mod acks;
pub mod backend;
pub mod client;
pub mod lifecycle;
pub mod message;
pub mod partitioner;
pub mod payload;
pub mod producer;
pub mod topics;
