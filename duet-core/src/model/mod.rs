mod payload;
mod peer;
mod signaling;

pub use payload::{IceCandidate, SdpType, SessionDescription};
pub use peer::PeerId;
pub use signaling::{CandidateSignal, IceServerConfig, NegotiationSignal, SignalMessage};
