use crate::hub::ConnectionHandle;
use dashmap::DashMap;
use duet_core::PeerId;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
pub enum Participant {
    /// A live signaling connection.
    Connected(ConnectionHandle),
    /// Injected by the churn simulator; has nobody to deliver to.
    Synthetic,
}

impl Participant {
    pub fn handle(&self) -> Option<&ConnectionHandle> {
        match self {
            Participant::Connected(handle) => Some(handle),
            Participant::Synthetic => None,
        }
    }
}

/// Set of currently connected participants.
///
/// Clones share the same map. Only the hub task mutates it; other tasks
/// (the HTTP endpoints) read from their clone.
#[derive(Clone, Default)]
pub struct Registry {
    participants: Arc<DashMap<PeerId, Participant>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a participant. A duplicate id replaces the previous entry.
    pub fn register(&self, peer_id: PeerId, handle: ConnectionHandle) {
        self.insert(peer_id, Participant::Connected(handle));
    }

    pub fn register_synthetic(&self, peer_id: PeerId) {
        self.insert(peer_id, Participant::Synthetic);
    }

    fn insert(&self, peer_id: PeerId, participant: Participant) {
        if self.participants.insert(peer_id.clone(), participant).is_some() {
            debug!("Participant {} registered twice, previous entry replaced", peer_id);
        }
    }

    pub fn unregister(&self, peer_id: &PeerId) -> Option<Participant> {
        self.participants.remove(peer_id).map(|(_, participant)| participant)
    }

    pub fn list(&self) -> Vec<PeerId> {
        self.participants
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn participant(&self, peer_id: &PeerId) -> Option<Participant> {
        self.participants
            .get(peer_id)
            .map(|entry| entry.value().clone())
    }

    pub fn handle(&self, peer_id: &PeerId) -> Option<ConnectionHandle> {
        self.participants
            .get(peer_id)
            .and_then(|entry| entry.value().handle().cloned())
    }

    /// Handles of every real connection, for broadcasts.
    pub fn connected(&self) -> Vec<(PeerId, ConnectionHandle)> {
        self.participants
            .iter()
            .filter_map(|entry| {
                entry
                    .value()
                    .handle()
                    .map(|handle| (entry.key().clone(), handle.clone()))
            })
            .collect()
    }

    pub fn contains(&self, peer_id: &PeerId) -> bool {
        self.participants.contains_key(peer_id)
    }

    pub fn is_synthetic(&self, peer_id: &PeerId) -> bool {
        self.participants
            .get(peer_id)
            .is_some_and(|entry| matches!(entry.value(), Participant::Synthetic))
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
