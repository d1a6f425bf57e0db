use crate::hub::HubCommand;
use duet_core::PeerId;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at, sleep};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChurnConfig {
    /// Time between two injected participants.
    pub interval: Duration,
    /// How long each injected participant stays.
    pub lifetime: Duration,
}

impl Default for ChurnConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            lifetime: Duration::from_secs(30),
        }
    }
}

/// Periodically injects and removes simulated participants to exercise the
/// join/leave notifications. Goes through the hub like any connection does.
pub struct ChurnSimulator {
    hub_tx: mpsc::Sender<HubCommand>,
    config: ChurnConfig,
}

impl ChurnSimulator {
    pub fn new(hub_tx: mpsc::Sender<HubCommand>, config: ChurnConfig) -> Self {
        Self { hub_tx, config }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Runs until the hub stops accepting commands.
    pub async fn run(self) {
        info!(
            "Churn simulator started (every {:?}, lifetime {:?})",
            self.config.interval, self.config.lifetime
        );
        let mut ticker = interval_at(Instant::now() + self.config.interval, self.config.interval);

        loop {
            ticker.tick().await;

            let peer_id = PeerId::simulated();
            let join = HubCommand::SimulatedJoin {
                peer_id: peer_id.clone(),
            };
            if self.hub_tx.send(join).await.is_err() {
                break;
            }

            let hub_tx = self.hub_tx.clone();
            let lifetime = self.config.lifetime;
            tokio::spawn(async move {
                sleep(lifetime).await;
                if hub_tx.send(HubCommand::SimulatedLeave { peer_id }).await.is_err() {
                    debug!("Hub gone before simulated participant could leave");
                }
            });
        }

        info!("Churn simulator stopped");
    }
}
