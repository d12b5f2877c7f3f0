use std::time::Duration;

use agent_kafka::ProducerConfig;
use agent_kafka::agent::flags::{ExampleFlags, FlagsPlugin};
use agent_kafka::agent::kafka::KafkaPlugin;
use agent_kafka::agent::status::StatusPlugin;
use agent_kafka::agent::{Agent, Plugin, event_loop_with_interrupt};
use agent_kafka::api::status::StatusState;
use agent_kafka::shared::utils::logger::init_logger;
use anyhow::Context;
use clap::Parser;
use crossbeam_utils::sync::WaitGroup;
use tokio::sync::oneshot;
use tracing::*;

const AGENT_NAME: &str = "flags-agent";
const MAX_STARTUP: Duration = Duration::from_secs(15);

#[derive(Debug, Parser)]
#[command(name = AGENT_NAME, about = "Example agent with custom flags and a Kafka producer")]
struct Args {
    /// Location of the etcd client config file.
    #[arg(long = "etcdv3-config", default_value = "etcd.conf")]
    etcdv3_config: String,

    /// Port of the status server.
    #[arg(long, default_value_t = 9191)]
    http_port: u16,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,

    /// Stop the example after this long.
    #[arg(long, default_value = "8s", value_parser = humantime::parse_duration)]
    finish_after: Duration,

    #[command(flatten)]
    flags: ExampleFlags,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if dotenvy::dotenv().is_err() {
        eprintln!("⚠️  .env file not found. Continuing with system environment variables.");
    }

    let producer_config = ProducerConfig::from_env().context("invalid kafka configuration")?;

    init_logger(debug_logging(args.debug, producer_config.as_ref()));
    info!(etcd_config = %args.etcdv3_config, "starting {AGENT_NAME}");
    if producer_config.is_none() {
        warn!("KAFKA_BROKERS not set, kafka plugin disabled");
    }

    let wait_group = WaitGroup::new();

    let flags_plugin = FlagsPlugin::new(args.flags.clone());
    let kafka_plugin = KafkaPlugin::new(AGENT_NAME, producer_config, &wait_group);
    let status_plugin = StatusPlugin::new(
        args.http_port,
        StatusState {
            producer: kafka_plugin.slot(),
            flags: args.flags,
        },
    );

    let plugins: Vec<Box<dyn Plugin>> = vec![
        Box::new(flags_plugin),
        Box::new(kafka_plugin),
        Box::new(status_plugin),
    ];
    let agent = Agent::new(MAX_STARTUP, plugins);

    let (finished_tx, finished_rx) = oneshot::channel();
    let finish_after = args.finish_after;
    tokio::spawn(async move {
        tokio::time::sleep(finish_after).await;
        info!("example finished after {:?}", finish_after);
        let _ = finished_tx.send(());
    });

    event_loop_with_interrupt(agent, finished_rx)
        .await
        .context("agent failed")?;

    // Blocks until every producer registered with the wait-group is closed.
    tokio::task::spawn_blocking(move || wait_group.wait())
        .await
        .context("wait-group task failed")?;

    info!("✅ {AGENT_NAME} exited cleanly");
    Ok(())
}

/// `--debug` or `KAFKA_DEBUG` both lower the global filter to debug.
fn debug_logging(cli_debug: bool, producer_config: Option<&ProducerConfig>) -> bool {
    cli_debug || producer_config.is_some_and(|config| config.debug)
}
