use std::net::SocketAddr;

use anyhow::Context;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::Plugin;
use crate::api::status::StatusState;
use crate::api::status::controller::status_routes;

/// Serves `/health` and `/flags` on localhost until closed.
pub struct StatusPlugin {
    port: u16,
    state: StatusState,
    addr: Option<SocketAddr>,
    shutdown: Option<oneshot::Sender<()>>,
    server: Option<JoinHandle<()>>,
}

impl StatusPlugin {
    pub fn new(port: u16, state: StatusState) -> Self {
        Self {
            port,
            state,
            addr: None,
            shutdown: None,
            server: None,
        }
    }

    /// Bound address, once the plugin is initialised.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.addr
    }
}

impl Plugin for StatusPlugin {
    fn name(&self) -> &'static str {
        "status"
    }

    fn init(&mut self) -> anyhow::Result<()> {
        let (tx, rx) = oneshot::channel::<()>();
        let (addr, server) = warp::serve(status_routes(self.state.clone()))
            .try_bind_with_graceful_shutdown(([127, 0, 0, 1], self.port), async move {
                rx.await.ok();
            })
            .with_context(|| format!("failed to bind status server on port {}", self.port))?;

        info!("status server running on http://{}", addr);
        self.addr = Some(addr);
        self.shutdown = Some(tx);
        self.server = Some(tokio::spawn(server));
        Ok(())
    }

    /// Signals graceful shutdown and waits for the server task to finish.
    ///
    /// Must run outside the async workers, as the agent's event loop does.
    fn close(&mut self) -> anyhow::Result<()> {
        if let Some(tx) = self.shutdown.take() {
            if tx.send(()).is_err() {
                warn!("status server already stopped");
            }
            info!("status server shutting down");
        }
        if let Some(server) = self.server.take() {
            Handle::current()
                .block_on(server)
                .context("status server task failed")?;
            info!("status server stopped");
        }
        Ok(())
    }
}
