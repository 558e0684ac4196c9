//! Server lifecycle: port negotiation, serving, and session expiry.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::handlers::AppState;
use super::listener::{bind_with_retry, DEFAULT_PORT, DEFAULT_PORT_RANGE};
use super::router::create_router_with_state;
use crate::error::DiagramSyncError;
use crate::page::PageConfig;
use crate::session::{ExpirySweeper, SessionStore, DEFAULT_SWEEP_INTERVAL, DEFAULT_TTL};
use crate::Result;

/// How long [`SyncServer::stop`] waits for in-flight requests to drain.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: IpAddr,
    /// Port tried first.
    pub port: u16,
    /// Extra ports tried above `port` when it is taken.
    pub port_range: u16,
    /// Age after which an unwritten session is evicted.
    pub session_ttl: Duration,
    /// Period of the expiry sweep.
    pub sweep_interval: Duration,
    /// Served page settings.
    pub page: PageConfig,
    /// Upper bound on waiting for open connections during stop.
    pub shutdown_grace: Duration,
}

impl ServerConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            host,
            port,
            ..Self::default()
        }
    }

    pub fn with_port_range(mut self, range: u16) -> Self {
        self.port_range = range;
        self
    }

    pub fn with_expiry(mut self, ttl: Duration, sweep_interval: Duration) -> Self {
        self.session_ttl = ttl;
        self.sweep_interval = sweep_interval;
        self
    }

    pub fn with_page(mut self, page: PageConfig) -> Self {
        self.page = page;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Highest port that will be tried.
    pub fn port_ceiling(&self) -> u16 {
        self.port.saturating_add(self.port_range)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            port_range: DEFAULT_PORT_RANGE,
            session_ttl: DEFAULT_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            page: PageConfig::default(),
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

struct Running {
    port: u16,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

/// The synchronization server.
///
/// Owns the session store, the listener and the expiry sweeper. Nothing is
/// bound or spawned until [`SyncServer::start`].
pub struct SyncServer {
    config: ServerConfig,
    state: AppState,
    sweeper: ExpirySweeper,
    running: Option<Running>,
}

impl SyncServer {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_store(config, Arc::new(SessionStore::new()))
    }

    /// Create a server around an existing store.
    pub fn with_store(config: ServerConfig, store: Arc<SessionStore>) -> Self {
        let state = AppState::with_store(Arc::clone(&store), config.page.clone());
        let sweeper = ExpirySweeper::new(store, config.session_ttl, config.sweep_interval);
        Self {
            config,
            state,
            sweeper,
            running: None,
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.state.store
    }

    pub fn sweeper(&self) -> &ExpirySweeper {
        &self.sweeper
    }

    /// Bound port while started.
    pub fn port(&self) -> Option<u16> {
        self.running.as_ref().map(|r| r.port)
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Bind, serve and start the sweeper; returns the bound port.
    ///
    /// Calling this on a started server returns the existing port.
    pub async fn start(&mut self) -> Result<u16> {
        if let Some(running) = &self.running {
            return Ok(running.port);
        }

        let (listener, port) =
            bind_with_retry(self.config.host, self.config.port, self.config.port_range).await?;
        self.state.set_port(port);

        let router = create_router_with_state(self.state.clone());
        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = rx.await;
                })
                .await
        });

        self.sweeper.start();
        self.running = Some(Running {
            port,
            shutdown: tx,
            task,
        });

        info!(host = %self.config.host, port, "diagram-sync server started");
        Ok(port)
    }

    /// Stop serving and release the port. No-op when not started.
    ///
    /// Open connections get [`ServerConfig::shutdown_grace`] to finish;
    /// after that the serving task is aborted.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(Running {
            port,
            shutdown,
            mut task,
        }) = self.running.take()
        else {
            return Ok(());
        };

        self.sweeper.stop().await;
        let _ = shutdown.send(());

        let outcome = match tokio::time::timeout(self.config.shutdown_grace, &mut task).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(e))) => Err(DiagramSyncError::Io(e)),
            Ok(Err(e)) => Err(DiagramSyncError::Server(e.to_string())),
            Err(_) => {
                warn!(
                    grace_ms = self.config.shutdown_grace.as_millis() as u64,
                    "connections still open after grace period, aborting"
                );
                task.abort();
                let _ = task.await;
                Ok(())
            }
        };
        if let Err(e) = &outcome {
            error!(error = %e, "server task ended with error");
        }

        info!(port, "diagram-sync server stopped");
        outcome
    }
}
