use crate::Error;
use duet_core::SignalMessage;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// WebSocket link to the signaling server.
pub struct SignalingClient {
    outbound: mpsc::UnboundedSender<SignalMessage>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl SignalingClient {
    /// Connects to `url` and returns the client plus the stream of server messages.
    pub async fn connect(
        url: &str,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SignalMessage>), Error> {
        let (ws_stream, _) = connect_async(url).await?;
        info!("Connected to signaling server at {}", url);

        let (mut ws_sender, mut ws_receiver) = ws_stream.split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<SignalMessage>();
        let (inbound_tx, inbound) = mpsc::unbounded_channel();

        let writer = tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                let json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Failed to encode {} message: {}", msg.op(), e);
                        continue;
                    }
                };
                debug!("WS OUT: {}", json);
                if ws_sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            let _ = ws_sender.close().await;
        });

        let reader = tokio::spawn(async move {
            while let Some(frame) = ws_receiver.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        debug!("WS IN: {}", text.as_str());
                        match serde_json::from_str::<SignalMessage>(&text) {
                            Ok(msg) => {
                                if inbound_tx.send(msg).is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!("Skipping invalid signaling frame: {}", e),
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Signaling connection error: {}", e);
                        break;
                    }
                }
            }
            info!("Signaling connection closed");
        });

        let client = Self {
            outbound,
            reader,
            writer,
        };
        Ok((client, inbound))
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<SignalMessage> {
        self.outbound.clone()
    }

    pub fn send(&self, msg: SignalMessage) -> Result<(), Error> {
        self.outbound.send(msg).map_err(|_| Error::ChannelClosed)
    }

    pub fn join(&self) -> Result<(), Error> {
        self.send(SignalMessage::Join)
    }

    /// Drops the socket; the server treats this as a disconnect.
    pub fn close(self) {
        self.reader.abort();
        self.writer.abort();
    }
}
