use crate::hub::Registry;
use duet_core::PeerId;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Matched with the oldest waiting participant.
    Paired { partner: PeerId },
    /// Nobody to match with yet; queued for the next joiner.
    Waiting,
    /// Join repeated while a pairing is active.
    AlreadyPaired { partner: PeerId },
    /// Not registered, or a synthetic participant.
    Ineligible,
}

/// Strict two-party pairing over a FIFO queue of unpaired participants.
#[derive(Debug, Default)]
pub struct Matchmaker {
    waiting: VecDeque<PeerId>,
    partners: HashMap<PeerId, PeerId>,
}

impl Matchmaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&mut self, peer_id: &PeerId, registry: &Registry) -> JoinOutcome {
        if !registry.contains(peer_id) || registry.is_synthetic(peer_id) {
            return JoinOutcome::Ineligible;
        }
        if let Some(partner) = self.partners.get(peer_id) {
            return JoinOutcome::AlreadyPaired {
                partner: partner.clone(),
            };
        }
        if self.waiting.contains(peer_id) {
            return JoinOutcome::Waiting;
        }

        if let Some(candidate) = self.pop_eligible(registry) {
            self.pair(peer_id, &candidate);
            return JoinOutcome::Paired { partner: candidate };
        }

        self.waiting.push_back(peer_id.clone());
        JoinOutcome::Waiting
    }

    /// Forgets `peer_id` and dissolves its pairing, returning the former partner.
    ///
    /// The former partner goes back to the front of the queue when it is still registered.
    pub fn leave(&mut self, peer_id: &PeerId, registry: &Registry) -> Option<PeerId> {
        self.waiting.retain(|id| id != peer_id);

        let partner = self.partners.remove(peer_id)?;
        self.partners.remove(&partner);

        if registry.contains(&partner) {
            self.waiting.push_front(partner.clone());
        }
        Some(partner)
    }

    /// Pairs the two oldest eligible waiting participants, if there are two.
    ///
    /// Returns `(joiner, partner)` where `partner` is the one that waited longer,
    /// mirroring what [`Matchmaker::join`] reports for a fresh joiner.
    pub fn pair_waiting(&mut self, registry: &Registry) -> Option<(PeerId, PeerId)> {
        let partner = self.pop_eligible(registry)?;
        let Some(joiner) = self.pop_eligible(registry) else {
            self.waiting.push_front(partner);
            return None;
        };
        self.pair(&joiner, &partner);
        Some((joiner, partner))
    }

    pub fn partner_of(&self, peer_id: &PeerId) -> Option<&PeerId> {
        self.partners.get(peer_id)
    }

    pub fn waiting(&self) -> Vec<PeerId> {
        self.waiting.iter().cloned().collect()
    }

    fn pop_eligible(&mut self, registry: &Registry) -> Option<PeerId> {
        while let Some(candidate) = self.waiting.pop_front() {
            // Entries can outlive their connection until the disconnect is processed.
            if registry.contains(&candidate) && !registry.is_synthetic(&candidate) {
                return Some(candidate);
            }
        }
        None
    }

    fn pair(&mut self, a: &PeerId, b: &PeerId) {
        self.partners.insert(a.clone(), b.clone());
        self.partners.insert(b.clone(), a.clone());
    }

    /// Each active pairing once, as `(a, b)` with `a < b`.
    pub fn pairs(&self) -> Vec<(PeerId, PeerId)> {
        let mut pairs: Vec<_> = self
            .partners
            .iter()
            .filter(|(a, b)| a < b)
            .map(|(a, b)| (a.clone(), b.clone()))
            .collect();
        pairs.sort();
        pairs
    }
}
