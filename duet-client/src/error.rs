use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Webrtc(#[from] webrtc::Error),
    #[error("unsupported session description type: {0:?}")]
    UnsupportedDescription(duet_core::SdpType),
    #[error("engine is closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media device unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Webrtc(#[from] webrtc::Error),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("media error: {0}")]
    Media(#[from] MediaError),
    #[error("signaling error: {0}")]
    Signaling(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("signaling channel closed")]
    ChannelClosed,
    #[error("no local id assigned by the server yet")]
    Unregistered,
}
