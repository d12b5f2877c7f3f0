//! Minimal host agent: plugins are initialised in order, closed in reverse,
//! and the event loop runs until Ctrl-C or until the embedder says it is done.

use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use tokio::sync::oneshot;
use tracing::{error, info};

pub mod flags;
pub mod kafka;
pub mod status;

pub trait Plugin: Send {
    fn name(&self) -> &'static str;

    fn init(&mut self) -> anyhow::Result<()>;

    /// Runs once every plugin has been initialised.
    fn after_init(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn close(&mut self) -> anyhow::Result<()>;
}

pub struct Agent {
    plugins: Vec<Box<dyn Plugin>>,
    max_startup: Duration,
    initialized: usize,
}

impl Agent {
    pub fn new(max_startup: Duration, plugins: Vec<Box<dyn Plugin>>) -> Self {
        Self {
            plugins,
            max_startup,
            initialized: 0,
        }
    }

    pub fn start(&mut self) -> anyhow::Result<()> {
        info!("starting agent with {} plugins", self.plugins.len());
        let started = Instant::now();

        for index in self.initialized..self.plugins.len() {
            let plugin = &mut self.plugins[index];
            let name = plugin.name();
            if let Err(err) = plugin.init() {
                error!("plugin {name} init failed: {err:#}");
                self.close_initialized();
                return Err(err).with_context(|| format!("plugin {name} failed to init"));
            }
            self.initialized = index + 1;
            info!("plugin {name} initialized");
        }

        for index in 0..self.plugins.len() {
            let plugin = &mut self.plugins[index];
            let name = plugin.name();
            if let Err(err) = plugin.after_init() {
                self.close_initialized();
                return Err(err).with_context(|| format!("plugin {name} failed after init"));
            }
        }

        let elapsed = started.elapsed();
        if elapsed > self.max_startup {
            self.close_initialized();
            bail!(
                "agent did not start within {:?} (took {:?})",
                self.max_startup,
                elapsed
            );
        }

        info!("all plugins initialized in {:?}", elapsed);
        Ok(())
    }

    /// Closes every initialised plugin in reverse order. Safe to call twice.
    pub fn stop(&mut self) -> anyhow::Result<()> {
        info!("stopping agent");
        let errors = self.close_initialized();
        if !errors.is_empty() {
            bail!("agent stopped with errors: {}", errors.join("; "));
        }
        info!("agent stopped");
        Ok(())
    }

    fn close_initialized(&mut self) -> Vec<String> {
        let mut errors = Vec::new();
        while self.initialized > 0 {
            self.initialized -= 1;
            let plugin = &mut self.plugins[self.initialized];
            if let Err(err) = plugin.close() {
                error!("plugin {} close failed: {err:#}", plugin.name());
                errors.push(format!("{}: {err:#}", plugin.name()));
            }
        }
        errors
    }
}

/// Starts the agent, waits for Ctrl-C or `finished`, then stops it.
///
/// Plugin hooks may block on network I/O, so start and stop run on the
/// blocking pool.
pub async fn event_loop_with_interrupt(
    mut agent: Agent,
    finished: oneshot::Receiver<()>,
) -> anyhow::Result<()> {
    let mut agent = run_blocking(move || {
        agent.start()?;
        Ok(agent)
    })
    .await?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for shutdown signal")?;
            info!("interrupt received, stopping agent");
        }
        _ = finished => info!("finished signal received, stopping agent"),
    }

    run_blocking(move || agent.stop()).await
}

async fn run_blocking<T, F>(hook: F) -> anyhow::Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(hook)
        .await
        .context("agent task panicked")?
}
