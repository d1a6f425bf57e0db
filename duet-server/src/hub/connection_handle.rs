use duet_core::SignalMessage;
use tokio::sync::mpsc;

/// Outbound half of a participant's signaling connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    tx: mpsc::UnboundedSender<SignalMessage>,
}

impl ConnectionHandle {
    pub fn new(tx: mpsc::UnboundedSender<SignalMessage>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SignalMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Queues a message without waiting. Fails only when the connection is gone.
    pub fn send(&self, msg: SignalMessage) -> Result<(), SignalMessage> {
        self.tx.send(msg).map_err(|e| e.0)
    }
}
