use crate::EngineError;
use crate::engine::{EngineEventSink, EngineFactory, PeerEngine};
use async_trait::async_trait;
use duet_core::{IceCandidate, IceServerConfig, SdpType, SessionDescription};
use std::sync::Arc;
use tracing::{debug, info};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::{API, APIBuilder};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

/// Builds `webrtc` peer connections sharing one media engine setup.
#[derive(Clone)]
pub struct WebrtcEngineFactory {
    api: Arc<API>,
}

impl WebrtcEngineFactory {
    pub fn new() -> Result<Self, EngineError> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        Ok(Self { api: Arc::new(api) })
    }
}

#[async_trait]
impl EngineFactory for WebrtcEngineFactory {
    type Engine = WebrtcEngine;

    async fn create_connection(
        &self,
        ice_servers: &[IceServerConfig],
        sink: EngineEventSink<Arc<TrackRemote>>,
    ) -> Result<WebrtcEngine, EngineError> {
        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers.iter().map(to_rtc_ice_server).collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(self.api.new_peer_connection(rtc_config).await?);

        let negotiation_sink = sink.clone();
        peer_connection.on_negotiation_needed(Box::new(move || {
            let sink = negotiation_sink.clone();
            Box::pin(async move {
                debug!("Negotiation needed for {}", sink.remote());
                sink.negotiation_needed();
            })
        }));

        let ice_sink = sink.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let sink = ice_sink.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                sink.ice_candidate(from_rtc_candidate(init));
            })
        }));

        let track_sink = sink.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let sink = track_sink.clone();
                Box::pin(async move {
                    info!("Remote {} track from {}", track.kind(), sink.remote());
                    sink.track(track);
                })
            },
        ));

        let state_sink = sink;
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let sink = state_sink.clone();
                Box::pin(async move {
                    info!("Peer connection with {} changed to {:?}", sink.remote(), s);
                    if s == RTCPeerConnectionState::Failed {
                        sink.failed();
                    }
                })
            },
        ));

        Ok(WebrtcEngine { peer_connection })
    }
}

pub struct WebrtcEngine {
    peer_connection: Arc<RTCPeerConnection>,
}

#[async_trait]
impl PeerEngine for WebrtcEngine {
    type Track = Arc<dyn TrackLocal + Send + Sync>;
    type RemoteTrack = Arc<TrackRemote>;

    async fn add_track(&self, track: Self::Track) -> Result<(), EngineError> {
        let sender = self.peer_connection.add_track(track).await?;

        // RTCP has to be drained for interceptors like NACK to work.
        tokio::spawn(async move {
            let mut rtcp_buf = vec![0u8; 1500];
            while sender.read(&mut rtcp_buf).await.is_ok() {}
        });
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription, EngineError> {
        let offer = self.peer_connection.create_offer(None).await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription, EngineError> {
        let answer = self.peer_connection.create_answer(None).await?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), EngineError> {
        let desc = to_rtc_description(description)?;
        self.peer_connection.set_local_description(desc).await?;
        Ok(())
    }

    async fn set_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), EngineError> {
        let desc = to_rtc_description(description)?;
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), EngineError> {
        self.peer_connection
            .add_ice_candidate(to_rtc_candidate(candidate))
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), EngineError> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

fn to_rtc_ice_server(server: &IceServerConfig) -> RTCIceServer {
    RTCIceServer {
        urls: server.urls.clone(),
        username: server.username.clone().unwrap_or_default(),
        credential: server.credential.clone().unwrap_or_default(),
    }
}

fn to_rtc_candidate(candidate: IceCandidate) -> RTCIceCandidateInit {
    RTCIceCandidateInit {
        candidate: candidate.candidate,
        sdp_mid: candidate.sdp_mid,
        sdp_mline_index: candidate.sdp_m_line_index,
        username_fragment: candidate.username_fragment,
    }
}

fn from_rtc_candidate(init: RTCIceCandidateInit) -> IceCandidate {
    IceCandidate {
        candidate: init.candidate,
        sdp_mid: init.sdp_mid,
        sdp_m_line_index: init.sdp_mline_index,
        username_fragment: init.username_fragment,
    }
}

fn to_rtc_description(
    description: SessionDescription,
) -> Result<RTCSessionDescription, EngineError> {
    let desc = match description.kind {
        SdpType::Offer => RTCSessionDescription::offer(description.sdp)?,
        SdpType::Answer => RTCSessionDescription::answer(description.sdp)?,
        SdpType::Pranswer => RTCSessionDescription::pranswer(description.sdp)?,
        SdpType::Rollback => return Err(EngineError::UnsupportedDescription(SdpType::Rollback)),
    };
    Ok(desc)
}
