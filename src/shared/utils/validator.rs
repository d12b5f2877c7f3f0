use tracing::debug;
use tracing::level_filters::LevelFilter;
use validator::{Validate, ValidationError};

use crate::shared::config::producer::ProducerConfig;
use crate::shared::error::ProducerError;
use crate::shared::kafka_message::acks::{RequiredAcks, native_acks};

/// Checks a producer config and applies defaults in place.
///
/// `Unset` acks become `WaitForAll`, and the debug flag raises the config's
/// logger to debug level.
pub fn validate_producer_config(config: &mut ProducerConfig) -> Result<(), ProducerError> {
    config.validate()?;

    if config.required_acks == RequiredAcks::Unset {
        config.required_acks = RequiredAcks::WaitForAll;
    }
    native_acks(config.required_acks)?;

    if config.debug {
        if let Some(logger) = &config.logger {
            logger.set_level(LevelFilter::DEBUG);
            debug!(logger = logger.name(), "debug logging enabled");
        }
    }
    Ok(())
}

pub fn validate_brokers(brokers: &[String]) -> Result<(), ValidationError> {
    if brokers.iter().any(|broker| broker.trim().is_empty()) {
        let mut error = ValidationError::new("blank_broker");
        error.message = Some("broker address must not be blank".into());
        return Err(error);
    }
    Ok(())
}
