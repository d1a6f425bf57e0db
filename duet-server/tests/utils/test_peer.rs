use anyhow::{Context, Result};
use std::time::Duration;
use tokio::sync::mpsc;

use duet_core::{PeerId, SignalMessage};
use duet_server::{ConnectionHandle, HubCommand};

use super::signal_helpers::{SIGNAL_TIMEOUT_MS, SILENCE_MS};

/// A participant attached to a hub through an in-memory connection.
pub struct TestPeer {
    pub peer_id: PeerId,
    hub_tx: mpsc::Sender<HubCommand>,
    rx: mpsc::UnboundedReceiver<SignalMessage>,
}

impl TestPeer {
    /// Connects and consumes the welcome and ICE config messages.
    pub async fn connect(hub_tx: &mpsc::Sender<HubCommand>) -> Result<Self> {
        let peer_id = PeerId::new();
        let (handle, rx) = ConnectionHandle::channel();
        hub_tx
            .send(HubCommand::Connect {
                peer_id: peer_id.clone(),
                handle,
            })
            .await
            .context("Hub is not running")?;

        let mut peer = Self {
            peer_id,
            hub_tx: hub_tx.clone(),
            rx,
        };

        match peer.recv().await? {
            SignalMessage::Welcome { peer_id } if peer_id == peer.peer_id => {}
            other => anyhow::bail!("Expected welcome, got {:?}", other),
        }
        match peer.recv().await? {
            SignalMessage::IceConfig { .. } => {}
            other => anyhow::bail!("Expected ice config, got {:?}", other),
        }
        Ok(peer)
    }

    pub async fn join(&self) -> Result<()> {
        self.command(HubCommand::Join {
            peer_id: self.peer_id.clone(),
        })
        .await
    }

    /// Sends a negotiation message the way the connection layer would.
    pub async fn send(&self, message: SignalMessage) -> Result<()> {
        self.command(HubCommand::Relay {
            from: self.peer_id.clone(),
            message: message.with_sender(&self.peer_id),
        })
        .await
    }

    pub async fn disconnect(&self) -> Result<()> {
        self.command(HubCommand::Disconnect {
            peer_id: self.peer_id.clone(),
        })
        .await
    }

    async fn command(&self, cmd: HubCommand) -> Result<()> {
        self.hub_tx.send(cmd).await.context("Hub is not running")
    }

    pub async fn recv(&mut self) -> Result<SignalMessage> {
        tokio::time::timeout(Duration::from_millis(SIGNAL_TIMEOUT_MS), self.rx.recv())
            .await
            .context("Timeout waiting for signal")?
            .context("Connection closed")
    }

    /// Waits without a deadline; meant for tests running on a paused clock.
    pub async fn next(&mut self) -> Option<SignalMessage> {
        self.rx.recv().await
    }

    /// Asserts that nothing is delivered within a short window.
    pub async fn expect_silence(&mut self) -> Result<()> {
        match tokio::time::timeout(Duration::from_millis(SILENCE_MS), self.rx.recv()).await {
            Err(_) => Ok(()),
            Ok(None) => Ok(()),
            Ok(Some(msg)) => anyhow::bail!("Expected silence, got {:?}", msg),
        }
    }
}
