pub mod environment;
pub mod producer;
