use crate::{
    Controller, ControllerEvent, Error, LocalStream, MediaSource, SignalingClient,
    WebrtcEngineFactory,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::info;
use webrtc::track::track_remote::TrackRemote;

/// A running client: local media, signaling link and negotiation controller.
pub struct Call {
    stream: LocalStream,
    signaling: SignalingClient,
    events: broadcast::Receiver<ControllerEvent<Arc<TrackRemote>>>,
    controller_task: JoinHandle<()>,
}

impl Call {
    /// Captures local media first; nothing is negotiated if that fails.
    pub async fn start<M: MediaSource>(url: &str, media: &M) -> Result<Self, Error> {
        let stream = media.create_local_capture().await?;
        let factory = WebrtcEngineFactory::new()?;
        let (signaling, inbound) = SignalingClient::connect(url).await?;

        let controller = Controller::new(factory, stream.tracks(), signaling.sender());
        let events = controller.subscribe();
        let controller_task = tokio::spawn(controller.run(inbound));

        signaling.join()?;
        info!("Joined, waiting for a partner");

        Ok(Self {
            stream,
            signaling,
            events,
            controller_task,
        })
    }

    pub fn stream(&self) -> &LocalStream {
        &self.stream
    }

    pub async fn next_event(&mut self) -> Option<ControllerEvent<Arc<TrackRemote>>> {
        loop {
            match self.events.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Closes the signaling link and waits for every session to be torn down.
    pub async fn hang_up(self) {
        self.signaling.close();
        let _ = self.controller_task.await;
        info!("Call ended");
    }
}
