use std::time::Duration;

use duet_core::SignalMessage;
use duet_server::{ChurnConfig, ChurnSimulator, request_snapshot};

use crate::integration::{create_test_hub, init_tracing};
use crate::utils::TestPeer;

#[tokio::test(start_paused = true)]
async fn test_churn_participants() {
    init_tracing();

    let (hub_tx, registry) = create_test_hub();

    let mut a = TestPeer::connect(&hub_tx).await.unwrap();
    a.join().await.unwrap();

    let _churn = ChurnSimulator::new(
        hub_tx.clone(),
        ChurnConfig {
            interval: Duration::from_secs(10),
            lifetime: Duration::from_secs(30),
        },
    )
    .spawn();

    let first = match a.next().await {
        Some(SignalMessage::UserJoined(id)) => id,
        other => panic!("Expected a simulated join, got {:?}", other),
    };
    assert!(first.is_simulated());
    assert!(registry.is_synthetic(&first));

    loop {
        match a.next().await {
            Some(SignalMessage::UserLeft(id)) if id == first => break,
            Some(SignalMessage::UserJoined(id)) => assert!(id.is_simulated()),
            other => panic!("Unexpected signal during churn: {:?}", other),
        }
    }
    assert!(!registry.contains(&first));

    // Simulated participants never take A's place in the pool.
    let snapshot = request_snapshot(&hub_tx).await.unwrap();
    assert_eq!(snapshot.waiting, vec![a.peer_id.clone()]);
    assert!(snapshot.pairs.is_empty());

    let mut b = TestPeer::connect(&hub_tx).await.unwrap();
    b.join().await.unwrap();
    assert_eq!(
        b.next().await,
        Some(SignalMessage::OtherUser(a.peer_id.clone()))
    );
}
