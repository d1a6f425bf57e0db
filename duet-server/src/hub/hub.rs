use crate::hub::{
    ConnectionHandle, HubCommand, HubSnapshot, JoinOutcome, Matchmaker, Registry, RelayOutcome,
    relay,
};
use anyhow::Context;
use duet_core::{IceServerConfig, PeerId, SignalMessage};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Owns the registry writes and the matchmaker.
///
/// Every mutation arrives as a [`HubCommand`] on one channel and is handled to
/// completion before the next, so two simultaneous joins can never pick the
/// same partner.
pub struct Hub {
    registry: Registry,
    matchmaker: Matchmaker,
    command_rx: mpsc::Receiver<HubCommand>,
    ice_servers: Vec<IceServerConfig>,
}

impl Hub {
    pub fn new(
        registry: Registry,
        command_rx: mpsc::Receiver<HubCommand>,
        ice_servers: Vec<IceServerConfig>,
    ) -> Self {
        Self {
            registry,
            matchmaker: Matchmaker::new(),
            command_rx,
            ice_servers,
        }
    }

    /// Starts a hub on its own task and returns the command sender.
    pub fn spawn(
        registry: Registry,
        ice_servers: Vec<IceServerConfig>,
    ) -> (mpsc::Sender<HubCommand>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(256);
        let hub = Hub::new(registry, rx, ice_servers);
        (tx, tokio::spawn(hub.run()))
    }

    pub async fn run(mut self) {
        info!("Hub event loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd);
        }

        info!("Command channel closed. Hub event loop finished");
    }

    fn handle_command(&mut self, cmd: HubCommand) {
        match cmd {
            HubCommand::Connect { peer_id, handle } => self.connect(peer_id, handle),

            HubCommand::Join { peer_id } => self.join(&peer_id),

            HubCommand::Relay { from, message } => {
                if !message.is_relayed() {
                    warn!("Ignoring non-relayable {} from {}", message.op(), from);
                    return;
                }
                if let RelayOutcome::Dropped { reason } = relay(&self.registry, message) {
                    debug!("Message from {} not delivered: {:?}", from, reason);
                }
            }

            HubCommand::Disconnect { peer_id } => self.disconnect(&peer_id),

            HubCommand::SimulatedJoin { peer_id } => {
                info!("Simulated participant {} joined", peer_id);
                self.registry.register_synthetic(peer_id.clone());
                self.broadcast(SignalMessage::UserJoined(peer_id));
            }

            HubCommand::SimulatedLeave { peer_id } => {
                if self.registry.unregister(&peer_id).is_none() {
                    return;
                }
                info!("Simulated participant {} left", peer_id);
                self.matchmaker.leave(&peer_id, &self.registry);
                self.broadcast(SignalMessage::UserLeft(peer_id));
            }

            HubCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn connect(&mut self, peer_id: PeerId, handle: ConnectionHandle) {
        info!("Participant connected: {}", peer_id);

        let _ = handle.send(SignalMessage::Welcome {
            peer_id: peer_id.clone(),
        });
        let _ = handle.send(SignalMessage::IceConfig {
            ice_servers: self.ice_servers.clone(),
        });
        self.registry.register(peer_id, handle);
    }

    fn join(&mut self, peer_id: &PeerId) {
        match self.matchmaker.join(peer_id, &self.registry) {
            JoinOutcome::Paired { partner } => self.announce_pair(peer_id, &partner),
            JoinOutcome::Waiting => info!("{} is waiting for a partner", peer_id),
            JoinOutcome::AlreadyPaired { partner } => {
                debug!("{} joined again while paired with {}", peer_id, partner);
            }
            JoinOutcome::Ineligible => warn!("Join from unknown participant {}", peer_id),
        }
    }

    fn disconnect(&mut self, peer_id: &PeerId) {
        if self.registry.unregister(peer_id).is_none() {
            return;
        }
        info!("Participant disconnected: {}", peer_id);

        if let Some(partner) = self.matchmaker.leave(peer_id, &self.registry) {
            self.notify(&partner, SignalMessage::UserLeft(peer_id.clone()));
        }
        if let Some((joiner, partner)) = self.matchmaker.pair_waiting(&self.registry) {
            self.announce_pair(&joiner, &partner);
        }
    }

    /// `partner` receives `user joined` and places the call.
    fn announce_pair(&self, joiner: &PeerId, partner: &PeerId) {
        info!("Paired {} with {}", joiner, partner);
        self.notify(joiner, SignalMessage::OtherUser(partner.clone()));
        self.notify(partner, SignalMessage::UserJoined(joiner.clone()));
    }

    fn notify(&self, peer_id: &PeerId, msg: SignalMessage) {
        let Some(handle) = self.registry.handle(peer_id) else {
            debug!("No connection for {}, {} not sent", peer_id, msg.op());
            return;
        };
        if handle.send(msg).is_err() {
            debug!("Connection for {} already closed", peer_id);
        }
    }

    fn broadcast(&self, msg: SignalMessage) {
        for (_, handle) in self.registry.connected() {
            let _ = handle.send(msg.clone());
        }
    }

    fn snapshot(&self) -> HubSnapshot {
        let mut peers = self.registry.list();
        peers.sort();
        HubSnapshot {
            peers,
            waiting: self.matchmaker.waiting(),
            pairs: self.matchmaker.pairs(),
        }
    }
}

/// Asks the hub for its current state.
pub async fn request_snapshot(hub_tx: &mpsc::Sender<HubCommand>) -> anyhow::Result<HubSnapshot> {
    let (reply, rx) = oneshot::channel();
    hub_tx
        .send(HubCommand::Snapshot { reply })
        .await
        .context("Hub is not running")?;
    rx.await.context("Hub dropped the snapshot request")
}
