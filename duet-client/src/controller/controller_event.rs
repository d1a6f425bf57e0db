use crate::controller::NegotiationState;
use duet_core::PeerId;

#[derive(Debug, Clone)]
pub enum ControllerEvent<R> {
    /// Server assigned this client its identifier.
    LocalId(PeerId),
    StateChanged {
        remote: PeerId,
        state: NegotiationState,
    },
    RemoteTrack {
        remote: PeerId,
        track: R,
    },
}
