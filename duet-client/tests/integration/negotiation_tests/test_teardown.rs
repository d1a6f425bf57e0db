use crate::integration::init_tracing;
use crate::utils::{ControllerHarness, exchange};
use duet_client::{ControllerEvent, NegotiationState};
use duet_core::{IceCandidate, PeerId, SignalMessage};

#[tokio::test]
async fn test_user_left_closes_session() {
    init_tracing();

    let mut a = ControllerHarness::new("peer-a").await;
    let mut b = ControllerHarness::new("peer-b").await;
    a.signal(SignalMessage::UserJoined(b.id.clone())).await;
    b.signal(SignalMessage::OtherUser(a.id.clone())).await;
    exchange(&mut a, &mut b).await;
    a.events();

    a.signal(SignalMessage::UserLeft(b.id.clone())).await;

    assert_eq!(a.state_of(&b.id), None);
    assert!(a.factory.engine(0).is_closed());
    let states: Vec<NegotiationState> = a
        .events()
        .into_iter()
        .filter_map(|e| match e {
            ControllerEvent::StateChanged { state, .. } => Some(state),
            _ => None,
        })
        .collect();
    assert_eq!(states, vec![NegotiationState::Closed]);
}

#[tokio::test]
async fn test_callback_after_teardown_is_noop() {
    init_tracing();

    let mut a = ControllerHarness::new("peer-a").await;
    let b = PeerId::from("peer-b");
    a.signal(SignalMessage::UserJoined(b.clone())).await;
    a.sent();
    a.signal(SignalMessage::UserLeft(b.clone())).await;

    let engine = a.factory.engine(0);
    engine.sink().negotiation_needed();
    engine
        .sink()
        .ice_candidate(IceCandidate::new("candidate:late"));
    assert_eq!(a.drain().await, 2);

    assert!(a.sent().is_empty());
    assert!(a.controller.sessions().is_empty());
}

#[tokio::test]
async fn test_stale_generation_is_dropped() {
    init_tracing();

    let mut a = ControllerHarness::new("peer-a").await;
    let b = PeerId::from("peer-b");
    a.signal(SignalMessage::UserJoined(b.clone())).await;
    a.signal(SignalMessage::UserLeft(b.clone())).await;
    a.signal(SignalMessage::UserJoined(b.clone())).await;
    a.sent();

    let stale = a.factory.engine(0);
    stale.sink().ice_candidate(IceCandidate::new("candidate:stale"));
    a.drain().await;

    assert!(a.sent().is_empty());
    assert_eq!(a.state_of(&b), Some(NegotiationState::NegotiatingOffer));
    assert_eq!(a.factory.engines().len(), 2);
}

#[tokio::test]
async fn test_shutdown_closes_every_session() {
    init_tracing();

    let mut a = ControllerHarness::new("peer-a").await;
    a.signal(SignalMessage::UserJoined(PeerId::from("peer-b"))).await;
    a.signal(SignalMessage::UserJoined(PeerId::simulated())).await;
    a.signal(SignalMessage::OtherUser(PeerId::from("peer-c"))).await;
    assert_eq!(a.controller.sessions().len(), 3);

    a.controller.shutdown().await;

    assert!(a.controller.sessions().is_empty());
    assert!(a.factory.engines().iter().all(|e| e.is_closed()));
}
