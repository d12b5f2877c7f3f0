pub mod config;
pub mod error;
pub mod kafka_message;
pub mod utils;
