use crate::hub::{Participant, Registry};
use duet_core::{PeerId, SignalMessage};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The message has no target (not an offer, answer or candidate).
    NotRelayable,
    /// Target is not registered.
    NotConnected,
    /// Target is a simulated participant.
    Synthetic,
    /// Target is registered but its connection already went away.
    ChannelClosed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Delivered { target: PeerId },
    Dropped { reason: DropReason },
}

/// Forwards `message` unchanged to its target.
///
/// Fire-and-forget: a message for a target that cannot take it is dropped,
/// never queued or retried. The outcome only reports what happened.
pub fn relay(registry: &Registry, message: SignalMessage) -> RelayOutcome {
    let Some(target) = message.target().cloned() else {
        return dropped(None, message.op(), DropReason::NotRelayable);
    };

    let handle = match registry.participant(&target) {
        Some(Participant::Connected(handle)) => handle,
        Some(Participant::Synthetic) => {
            return dropped(Some(&target), message.op(), DropReason::Synthetic);
        }
        None => return dropped(Some(&target), message.op(), DropReason::NotConnected),
    };

    let op = message.op();
    match handle.send(message) {
        Ok(()) => {
            debug!("Relayed {} to {}", op, target);
            RelayOutcome::Delivered { target }
        }
        Err(_) => dropped(Some(&target), op, DropReason::ChannelClosed),
    }
}

fn dropped(target: Option<&PeerId>, op: &str, reason: DropReason) -> RelayOutcome {
    debug!("Dropped {} for {:?}: {:?}", op, target, reason);
    RelayOutcome::Dropped { reason }
}
