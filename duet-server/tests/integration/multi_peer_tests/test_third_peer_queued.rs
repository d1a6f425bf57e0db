use duet_core::SignalMessage;
use duet_server::request_snapshot;

use crate::integration::{create_test_hub, init_tracing};
use crate::utils::TestPeer;

#[tokio::test]
async fn test_third_peer_queued() {
    init_tracing();

    let (hub_tx, _registry) = create_test_hub();

    let mut a = TestPeer::connect(&hub_tx).await.unwrap();
    let mut b = TestPeer::connect(&hub_tx).await.unwrap();
    let mut c = TestPeer::connect(&hub_tx).await.unwrap();

    a.join().await.unwrap();
    b.join().await.unwrap();
    c.join().await.unwrap();

    assert_eq!(
        b.recv().await.unwrap(),
        SignalMessage::OtherUser(a.peer_id.clone())
    );
    assert_eq!(
        a.recv().await.unwrap(),
        SignalMessage::UserJoined(b.peer_id.clone())
    );

    // C is not matched against anyone already paired.
    c.expect_silence().await.unwrap();
    a.expect_silence().await.unwrap();
    b.expect_silence().await.unwrap();

    let snapshot = request_snapshot(&hub_tx).await.unwrap();
    assert_eq!(snapshot.waiting, vec![c.peer_id.clone()]);
    assert_eq!(snapshot.pairs.len(), 1);

    // When A leaves, B is matched with the queued C right away.
    a.disconnect().await.unwrap();
    assert_eq!(
        b.recv().await.unwrap(),
        SignalMessage::UserLeft(a.peer_id.clone())
    );
    assert_eq!(
        b.recv().await.unwrap(),
        SignalMessage::UserJoined(c.peer_id.clone())
    );
    assert_eq!(
        c.recv().await.unwrap(),
        SignalMessage::OtherUser(b.peer_id.clone())
    );

    let snapshot = request_snapshot(&hub_tx).await.unwrap();
    assert!(snapshot.waiting.is_empty());
    assert_eq!(snapshot.pairs.len(), 1);

    // A later joiner waits instead of displacing either of them.
    let mut d = TestPeer::connect(&hub_tx).await.unwrap();
    d.join().await.unwrap();
    d.expect_silence().await.unwrap();
    b.expect_silence().await.unwrap();
    c.expect_silence().await.unwrap();

    let snapshot = request_snapshot(&hub_tx).await.unwrap();
    assert_eq!(snapshot.waiting, vec![d.peer_id.clone()]);
}
