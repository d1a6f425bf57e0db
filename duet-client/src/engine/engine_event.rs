use duet_core::{IceCandidate, PeerId};
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub enum EngineEventKind<R> {
    NegotiationNeeded,
    IceCandidate(IceCandidate),
    Track(R),
    Failed,
}

/// Engine callback tagged with the session it was raised for.
#[derive(Debug, Clone)]
pub struct EngineEvent<R> {
    pub remote: PeerId,
    pub generation: u64,
    pub kind: EngineEventKind<R>,
}

/// Handle an engine uses to report callbacks back into the controller loop.
pub struct EngineEventSink<R> {
    remote: PeerId,
    generation: u64,
    tx: mpsc::UnboundedSender<EngineEvent<R>>,
}

impl<R> EngineEventSink<R> {
    pub fn new(remote: PeerId, generation: u64, tx: mpsc::UnboundedSender<EngineEvent<R>>) -> Self {
        Self {
            remote,
            generation,
            tx,
        }
    }

    pub fn remote(&self) -> &PeerId {
        &self.remote
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn negotiation_needed(&self) {
        self.emit(EngineEventKind::NegotiationNeeded);
    }

    pub fn ice_candidate(&self, candidate: IceCandidate) {
        self.emit(EngineEventKind::IceCandidate(candidate));
    }

    pub fn track(&self, track: R) {
        self.emit(EngineEventKind::Track(track));
    }

    pub fn failed(&self) {
        self.emit(EngineEventKind::Failed);
    }

    fn emit(&self, kind: EngineEventKind<R>) {
        // The controller may already be gone; late callbacks are dropped.
        let _ = self.tx.send(EngineEvent {
            remote: self.remote.clone(),
            generation: self.generation,
            kind,
        });
    }
}

impl<R> Clone for EngineEventSink<R> {
    fn clone(&self) -> Self {
        Self {
            remote: self.remote.clone(),
            generation: self.generation,
            tx: self.tx.clone(),
        }
    }
}
