use crate::hub::{HubCommand, HubSnapshot, request_snapshot};
use duet_core::{PeerId, SignalMessage};
use tokio::sync::mpsc;
use tracing::{error, warn};

/// Shared state of the signaling endpoints: the hub's command channel.
#[derive(Clone)]
pub struct SignalingService {
    hub_tx: mpsc::Sender<HubCommand>,
}

impl SignalingService {
    pub fn new(hub_tx: mpsc::Sender<HubCommand>) -> Self {
        Self { hub_tx }
    }

    pub(crate) async fn send_command(&self, cmd: HubCommand) -> bool {
        if let Err(e) = self.hub_tx.send(cmd).await {
            error!("Hub died: {}", e);
            return false;
        }
        true
    }

    /// Turns a frame received from `peer_id` into a hub command.
    ///
    /// Returns `false` once the hub is gone.
    pub(crate) async fn dispatch(&self, peer_id: &PeerId, msg: SignalMessage) -> bool {
        let cmd = match msg {
            SignalMessage::Join => HubCommand::Join {
                peer_id: peer_id.clone(),
            },
            msg if msg.is_relayed() => HubCommand::Relay {
                from: peer_id.clone(),
                message: msg.with_sender(peer_id),
            },
            other => {
                warn!("Unexpected {} from client {}", other.op(), peer_id);
                return true;
            }
        };
        self.send_command(cmd).await
    }

    pub async fn snapshot(&self) -> anyhow::Result<HubSnapshot> {
        request_snapshot(&self.hub_tx).await
    }
}
