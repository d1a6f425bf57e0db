use crate::churn::ChurnSimulator;
use crate::config::ServerConfig;
use crate::hub::{Hub, Registry};
use crate::signaling::{SignalingService, router};
use anyhow::Context;
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::info;

/// A bound signaling server with its hub (and churn simulator, if enabled) running.
pub struct SignalingServer {
    listener: TcpListener,
    app: Router,
    hub_task: JoinHandle<()>,
    churn_task: Option<JoinHandle<()>>,
}

impl SignalingServer {
    pub async fn bind(config: ServerConfig) -> anyhow::Result<Self> {
        let (hub_tx, hub_task) = Hub::spawn(Registry::new(), config.ice_servers());

        let churn_task = config
            .churn()
            .map(|churn| ChurnSimulator::new(hub_tx.clone(), churn).spawn());

        let app = router(SignalingService::new(hub_tx.clone()));

        let listener = TcpListener::bind(config.bind)
            .await
            .with_context(|| format!("Failed to bind {}", config.bind))?;

        Ok(Self {
            listener,
            app,
            hub_task,
            churn_task,
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("Listener has no local address")
    }

    pub async fn run(self) -> anyhow::Result<()> {
        info!("Signaling server listening on http://{}", self.local_addr()?);

        let result = axum::serve(self.listener, self.app)
            .await
            .context("Server error");

        if let Some(churn_task) = self.churn_task {
            churn_task.abort();
        }
        self.hub_task.abort();
        result
    }
}
