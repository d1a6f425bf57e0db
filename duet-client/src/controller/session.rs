use duet_core::{IceCandidate, PeerId};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Remote candidates kept while no remote description is set.
pub(crate) const MAX_PENDING_CANDIDATES: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Sends the offer; learned from `user joined`.
    Caller,
    /// Waits for the offer; learned from `other user`.
    Callee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Idle,
    NegotiatingOffer,
    NegotiatingAnswer,
    Connected,
    Closed,
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NegotiationState::Idle => "idle",
            NegotiationState::NegotiatingOffer => "negotiating-offer",
            NegotiationState::NegotiatingAnswer => "negotiating-answer",
            NegotiationState::Connected => "connected",
            NegotiationState::Closed => "closed",
        };
        f.write_str(name)
    }
}

pub(crate) struct Session<E> {
    pub remote: PeerId,
    pub role: Role,
    pub engine: Option<Arc<E>>,
    pub state: NegotiationState,
    pub generation: u64,
    pub remote_description_set: bool,
    pending_candidates: VecDeque<IceCandidate>,
}

impl<E> Session<E> {
    pub fn new(remote: PeerId, role: Role, generation: u64) -> Self {
        Self {
            remote,
            role,
            engine: None,
            state: NegotiationState::Idle,
            generation,
            remote_description_set: false,
            pending_candidates: VecDeque::new(),
        }
    }

    pub fn engine(&self) -> Option<Arc<E>> {
        self.engine.clone()
    }

    pub fn buffer_candidate(&mut self, candidate: IceCandidate) {
        if self.pending_candidates.len() == MAX_PENDING_CANDIDATES {
            warn!(
                "Candidate buffer for {} is full, dropping the oldest",
                self.remote
            );
            self.pending_candidates.pop_front();
        }
        self.pending_candidates.push_back(candidate);
    }

    pub fn take_pending_candidates(&mut self) -> Vec<IceCandidate> {
        self.pending_candidates.drain(..).collect()
    }

    #[cfg(test)]
    pub fn pending_len(&self) -> usize {
        self.pending_candidates.len()
    }
}
