use crate::EngineError;
use crate::engine::EngineEventSink;
use async_trait::async_trait;
use duet_core::{IceCandidate, IceServerConfig, SessionDescription};

/// One peer connection instance, exclusively owned by a negotiation session.
#[async_trait]
pub trait PeerEngine: Send + Sync + 'static {
    /// Local media track attached before negotiating.
    type Track: Clone + Send + Sync + 'static;
    /// Remote media track surfaced once the peer starts sending.
    type RemoteTrack: Clone + Send + Sync + 'static;

    async fn add_track(&self, track: Self::Track) -> Result<(), EngineError>;

    async fn create_offer(&self) -> Result<SessionDescription, EngineError>;

    async fn create_answer(&self) -> Result<SessionDescription, EngineError>;

    async fn set_local_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), EngineError>;

    async fn set_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), EngineError>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), EngineError>;

    async fn close(&self) -> Result<(), EngineError>;
}

#[async_trait]
pub trait EngineFactory: Send + Sync + 'static {
    type Engine: PeerEngine;

    /// Create a fresh connection; callbacks flow through `sink` for its whole lifetime.
    async fn create_connection(
        &self,
        ice_servers: &[IceServerConfig],
        sink: EngineEventSink<<Self::Engine as PeerEngine>::RemoteTrack>,
    ) -> Result<Self::Engine, EngineError>;
}
