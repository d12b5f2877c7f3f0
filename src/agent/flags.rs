use std::time::Duration;

use clap::Args;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::info;

use super::Plugin;

const LOG_DELAY: Duration = Duration::from_secs(3);

/// Example flags of every supported type, registered on the agent's command line.
#[derive(Debug, Clone, Args, Serialize)]
pub struct ExampleFlags {
    /// Example of a string flag.
    #[arg(long = "ep-string", default_value = "my-value")]
    pub ep_string: String,

    /// Example of an int flag.
    #[arg(long = "ep-int", default_value_t = 1122, allow_negative_numbers = true)]
    pub ep_int: i32,

    /// Example of an int64 flag.
    #[arg(long = "ep-int64", default_value_t = -3344, allow_negative_numbers = true)]
    pub ep_int64: i64,

    /// Example of a uint flag.
    #[arg(long = "ep-uint", default_value_t = 5566)]
    pub ep_uint: u32,

    /// Example of a uint64 flag.
    #[arg(long = "ep-uint64", default_value_t = 7788)]
    pub ep_uint64: u64,

    /// Example of a bool flag.
    #[arg(long = "ep-bool", default_value_t = true, action = clap::ArgAction::Set)]
    pub ep_bool: bool,

    /// Example of a duration flag.
    #[arg(long = "ep-duration", default_value = "5s", value_parser = humantime::parse_duration)]
    #[serde(with = "humantime_serde")]
    pub ep_duration: Duration,
}

/// Logs the runtime values of [`ExampleFlags`] a few seconds after init.
pub struct FlagsPlugin {
    flags: ExampleFlags,
    log_delay: Duration,
    task: Option<JoinHandle<()>>,
}

impl FlagsPlugin {
    pub fn new(flags: ExampleFlags) -> Self {
        Self {
            flags,
            log_delay: LOG_DELAY,
            task: None,
        }
    }

    pub fn with_log_delay(mut self, delay: Duration) -> Self {
        self.log_delay = delay;
        self
    }
}

impl Plugin for FlagsPlugin {
    fn name(&self) -> &'static str {
        "example-plugin"
    }

    fn init(&mut self) -> anyhow::Result<()> {
        info!("Registering flags");
        info!("Initialization of the custom plugin for the flags example is completed");

        let flags = self.flags.clone();
        let delay = self.log_delay;
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            log_flags(&flags);
        }));
        Ok(())
    }

    fn close(&mut self) -> anyhow::Result<()> {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        Ok(())
    }
}

pub fn log_flags(flags: &ExampleFlags) {
    info!("Logging flags");
    info!("testFlagString:'{}'", flags.ep_string);
    info!("testFlagInt:'{}'", flags.ep_int);
    info!("testFlagInt64:'{}'", flags.ep_int64);
    info!("testFlagUint:'{}'", flags.ep_uint);
    info!("testFlagUint64:'{}'", flags.ep_uint64);
    info!("testFlagBool:'{}'", flags.ep_bool);
    info!("testFlagDur:'{}'", humantime::format_duration(flags.ep_duration));
}
