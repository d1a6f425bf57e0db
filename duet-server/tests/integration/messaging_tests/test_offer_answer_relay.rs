use duet_core::SignalMessage;

use crate::integration::{create_test_hub, init_tracing};
use crate::utils::{TestPeer, answer, candidate, offer};

#[tokio::test]
async fn test_offer_answer_relay() {
    init_tracing();

    let (hub_tx, _registry) = create_test_hub();

    let mut a = TestPeer::connect(&hub_tx).await.unwrap();
    let mut b = TestPeer::connect(&hub_tx).await.unwrap();
    let mut c = TestPeer::connect(&hub_tx).await.unwrap();

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

    let sent_offer = offer(&b.peer_id, &a.peer_id);
    a.send(sent_offer.clone()).await.unwrap();
    assert_eq!(b.recv().await.unwrap(), sent_offer);

    let sent_answer = answer(&a.peer_id, &b.peer_id);
    b.send(sent_answer.clone()).await.unwrap();
    assert_eq!(a.recv().await.unwrap(), sent_answer);

    for _ in 0..3 {
        a.send(candidate(&b.peer_id, Some(&a.peer_id))).await.unwrap();
    }
    for _ in 0..3 {
        assert_eq!(
            b.recv().await.unwrap(),
            candidate(&b.peer_id, Some(&a.peer_id))
        );
    }

    // Nothing leaked to the bystander or back to the senders.
    c.expect_silence().await.unwrap();
    a.expect_silence().await.unwrap();
    b.expect_silence().await.unwrap();
}
