use crate::hub::ConnectionHandle;
use duet_core::{PeerId, SignalMessage};
use serde::Serialize;
use tokio::sync::oneshot;

/// Commands processed one at a time by the hub task.
#[derive(Debug)]
pub enum HubCommand {
    /// A signaling connection was accepted.
    Connect {
        peer_id: PeerId,
        handle: ConnectionHandle,
    },

    /// The participant asks to be paired.
    Join { peer_id: PeerId },

    /// Offer, answer or ICE candidate from `from`, to be forwarded to its target.
    Relay { from: PeerId, message: SignalMessage },

    /// The connection closed.
    Disconnect { peer_id: PeerId },

    /// Churn simulator injects a participant.
    SimulatedJoin { peer_id: PeerId },

    /// Churn simulator removes a participant it injected.
    SimulatedLeave { peer_id: PeerId },

    Snapshot { reply: oneshot::Sender<HubSnapshot> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HubSnapshot {
    pub peers: Vec<PeerId>,
    pub waiting: Vec<PeerId>,
    pub pairs: Vec<(PeerId, PeerId)>,
}
