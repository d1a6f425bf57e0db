use crate::hub::{ConnectionHandle, HubCommand};
use crate::signaling::SignalingService;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use duet_core::{PeerId, SignalMessage};
use futures::{SinkExt, StreamExt};
use tracing::{error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    let peer_id = PeerId::new();

    ws.on_upgrade(move |socket| handle_socket(socket, peer_id, service))
}

async fn handle_socket(socket: WebSocket, peer_id: PeerId, service: SignalingService) {
    info!("New WebSocket connection: {}", peer_id);

    let (mut sender, mut receiver) = socket.split();
    let (handle, mut rx) = ConnectionHandle::channel();

    let connect = HubCommand::Connect {
        peer_id: peer_id.clone(),
        handle,
    };
    if !service.send_command(connect).await {
        return;
    }

    let mut send_task = tokio::spawn({
        let peer_id = peer_id.clone();

        async move {
            while let Some(msg) = rx.recv().await {
                let json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to serialize {} for {}: {}", msg.op(), peer_id, e);
                        continue;
                    }
                };
                if sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();
        let peer_id = peer_id.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<SignalMessage>(&text) {
                        Ok(signal) => {
                            if !service.dispatch(&peer_id, signal).await {
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid SignalMessage from {}: {}", peer_id, e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    service
        .send_command(HubCommand::Disconnect {
            peer_id: peer_id.clone(),
        })
        .await;
    info!("WebSocket disconnected: {}", peer_id);
}
