use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Builder;
use tracing_subscriber::{EnvFilter, Registry}; // Enables `.with()` chaining for layers
use tracing_subscriber::{fmt, prelude::*};

/// Installs the process-wide subscriber for the agent binary.
///
/// `RUST_LOG` wins when set; otherwise the filter is `info`, or `debug` when
/// `debug` is true.
pub fn init_logger(debug: bool) {
    let env_filter = filter_builder(debug).from_env_lossy();

    let fmt_layer = fmt::layer()
        .with_target(false) // hide module path
        .with_level(true)
        .with_line_number(true)
        .with_file(true);

    Registry::default().with(env_filter).with(fmt_layer).init();
}

fn filter_builder(debug: bool) -> Builder {
    let default_level = if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    EnvFilter::builder().with_default_directive(default_level.into())
}

/// Named logging handle injected into a component.
///
/// The handle does not own a subscriber. It carries a name that is attached to
/// every event and a level that gates which events the component emits, so a
/// caller can raise one producer to debug without touching the global filter.
/// Clones share the same level.
#[derive(Debug, Clone)]
pub struct Logger {
    name: Arc<str>,
    level: Arc<AtomicU8>,
}

impl serde::Serialize for Logger {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

impl Logger {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            level: Arc::new(AtomicU8::new(encode(LevelFilter::INFO))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> LevelFilter {
        decode(self.level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, level: LevelFilter) {
        self.level.store(encode(level), Ordering::Relaxed);
    }

    pub fn enabled(&self, level: Level) -> bool {
        self.level() >= level
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new("kafka-producer")
    }
}

const LEVELS: [LevelFilter; 6] = [
    LevelFilter::OFF,
    LevelFilter::ERROR,
    LevelFilter::WARN,
    LevelFilter::INFO,
    LevelFilter::DEBUG,
    LevelFilter::TRACE,
];

fn encode(level: LevelFilter) -> u8 {
    LEVELS
        .iter()
        .position(|candidate| *candidate == level)
        .unwrap_or(LEVELS.len() - 1) as u8
}

fn decode(value: u8) -> LevelFilter {
    LEVELS
        .get(value as usize)
        .copied()
        .unwrap_or(LevelFilter::TRACE)
}
