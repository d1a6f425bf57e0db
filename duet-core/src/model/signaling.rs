use crate::model::peer::PeerId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

/// Offer or answer addressed to `target`. `sdp` is never interpreted by the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationSignal {
    pub target: PeerId,
    pub caller: PeerId,
    pub sdp: Value,
}

/// Trickled ICE candidate addressed to `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSignal {
    pub target: PeerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller: Option<PeerId>,
    pub candidate: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "d")]
pub enum SignalMessage {
    #[serde(rename = "join")]
    Join,
    #[serde(rename = "welcome")]
    Welcome { peer_id: PeerId },
    #[serde(rename = "ice config")]
    IceConfig { ice_servers: Vec<IceServerConfig> },
    #[serde(rename = "other user")]
    OtherUser(PeerId),
    #[serde(rename = "user joined")]
    UserJoined(PeerId),
    #[serde(rename = "user left")]
    UserLeft(PeerId),
    #[serde(rename = "offer")]
    Offer(NegotiationSignal),
    #[serde(rename = "answer")]
    Answer(NegotiationSignal),
    #[serde(rename = "ice-candidate")]
    IceCandidate(CandidateSignal),
}

impl SignalMessage {
    /// Recipient of a relayed message; `None` for messages the server handles itself.
    pub fn target(&self) -> Option<&PeerId> {
        match self {
            SignalMessage::Offer(signal) | SignalMessage::Answer(signal) => Some(&signal.target),
            SignalMessage::IceCandidate(signal) => Some(&signal.target),
            _ => None,
        }
    }

    /// Sender of a relayed message, if it carries one.
    pub fn sender(&self) -> Option<&PeerId> {
        match self {
            SignalMessage::Offer(signal) | SignalMessage::Answer(signal) => Some(&signal.caller),
            SignalMessage::IceCandidate(signal) => signal.caller.as_ref(),
            _ => None,
        }
    }

    pub fn is_relayed(&self) -> bool {
        self.target().is_some()
    }

    /// Stamps the connection a relayed message actually came from as its sender,
    /// replacing whatever the client put there.
    pub fn with_sender(self, from: &PeerId) -> Self {
        match self {
            SignalMessage::Offer(mut signal) => {
                signal.caller = from.clone();
                SignalMessage::Offer(signal)
            }
            SignalMessage::Answer(mut signal) => {
                signal.caller = from.clone();
                SignalMessage::Answer(signal)
            }
            SignalMessage::IceCandidate(mut signal) => {
                signal.caller = Some(from.clone());
                SignalMessage::IceCandidate(signal)
            }
            other => other,
        }
    }

    pub fn op(&self) -> &'static str {
        match self {
            SignalMessage::Join => "join",
            SignalMessage::Welcome { .. } => "welcome",
            SignalMessage::IceConfig { .. } => "ice config",
            SignalMessage::OtherUser(_) => "other user",
            SignalMessage::UserJoined(_) => "user joined",
            SignalMessage::UserLeft(_) => "user left",
            SignalMessage::Offer(_) => "offer",
            SignalMessage::Answer(_) => "answer",
            SignalMessage::IceCandidate(_) => "ice-candidate",
        }
    }
}
