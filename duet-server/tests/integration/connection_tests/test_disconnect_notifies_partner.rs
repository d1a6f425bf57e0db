use duet_core::SignalMessage;
use duet_server::request_snapshot;

use crate::integration::{create_test_hub, init_tracing};
use crate::utils::{TestPeer, candidate};

#[tokio::test]
async fn test_disconnect_notifies_partner() {
    init_tracing();

    let (hub_tx, registry) = create_test_hub();

    let mut a = TestPeer::connect(&hub_tx).await.unwrap();
    let mut b = TestPeer::connect(&hub_tx).await.unwrap();
    a.join().await.unwrap();
    b.join().await.unwrap();

    assert_eq!(
        b.recv().await.unwrap(),
        SignalMessage::OtherUser(a.peer_id.clone())
    );
    assert_eq!(
        a.recv().await.unwrap(),
        SignalMessage::UserJoined(b.peer_id.clone())
    );

    // A goes away mid-negotiation.
    a.disconnect().await.unwrap();
    assert_eq!(
        b.recv().await.unwrap(),
        SignalMessage::UserLeft(a.peer_id.clone())
    );
    assert!(!registry.contains(&a.peer_id));

    // B's late candidate for A is dropped without disturbing anyone.
    b.send(candidate(&a.peer_id, None)).await.unwrap();
    b.expect_silence().await.unwrap();
    a.expect_silence().await.unwrap();

    // B is back in the pool and the hub is still serving.
    let snapshot = request_snapshot(&hub_tx).await.unwrap();
    assert_eq!(snapshot.waiting, vec![b.peer_id.clone()]);
}

#[tokio::test]
async fn test_disconnected_peer_is_never_matched() {
    init_tracing();

    let (hub_tx, _registry) = create_test_hub();

    let a = TestPeer::connect(&hub_tx).await.unwrap();
    a.join().await.unwrap();
    a.disconnect().await.unwrap();

    let mut b = TestPeer::connect(&hub_tx).await.unwrap();
    b.join().await.unwrap();
    b.expect_silence().await.unwrap();

    let snapshot = request_snapshot(&hub_tx).await.unwrap();
    assert_eq!(snapshot.peers, vec![b.peer_id.clone()]);
    assert_eq!(snapshot.waiting, vec![b.peer_id.clone()]);
}
