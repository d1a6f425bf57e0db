use crate::integration::init_tracing;
use crate::utils::{ControllerHarness, EngineCall, count_op, deliver, exchange};
use duet_client::{ControllerEvent, NegotiationState, Role};
use duet_core::SignalMessage;

#[tokio::test]
async fn test_offer_answer_reaches_connected_on_both_sides() {
    init_tracing();

    let mut a = ControllerHarness::new("peer-a").await;
    let mut b = ControllerHarness::new("peer-b").await;

    // b joined second: a is told about b, b is told about a
    a.signal(SignalMessage::UserJoined(b.id.clone())).await;
    b.signal(SignalMessage::OtherUser(a.id.clone())).await;

    assert_eq!(a.controller.role_of(&b.id), Some(Role::Caller));
    assert_eq!(b.controller.role_of(&a.id), Some(Role::Callee));
    assert_eq!(a.state_of(&b.id), Some(NegotiationState::NegotiatingOffer));
    assert_eq!(b.state_of(&a.id), Some(NegotiationState::Idle));

    let from_a = a.sent();
    assert_eq!(count_op(&from_a, "offer"), 1);
    let SignalMessage::Offer(offer) = &from_a[0] else {
        panic!("expected an offer first, got {:?}", from_a[0]);
    };
    assert_eq!(offer.target, b.id);
    assert_eq!(offer.caller, a.id);
    assert_eq!(offer.sdp["type"], "offer");

    let from_b = deliver(from_a, &mut b).await;
    assert_eq!(b.state_of(&a.id), Some(NegotiationState::Connected));
    assert_eq!(count_op(&from_b, "answer"), 1);
    assert_eq!(count_op(&from_b, "ice-candidate"), 1);

    let back = deliver(from_b, &mut a).await;
    assert!(back.is_empty(), "no further offer expected: {:?}", back);
    assert_eq!(a.state_of(&b.id), Some(NegotiationState::Connected));

    // Each side applied the other's trickled candidate.
    let a_engine = a.factory.engine(0);
    let b_engine = b.factory.engine(0);
    assert_eq!(
        a_engine.count(&EngineCall::AddCandidate("candidate:local-for-peer-a".into())),
        1
    );
    assert_eq!(
        b_engine.count(&EngineCall::AddCandidate("candidate:local-for-peer-b".into())),
        1
    );
    assert_eq!(a_engine.count(&EngineCall::CreateOffer), 1);
    assert_eq!(b_engine.count(&EngineCall::CreateAnswer), 1);

    let remote_tracks: Vec<String> = a
        .events()
        .into_iter()
        .filter_map(|e| match e {
            ControllerEvent::RemoteTrack { track, .. } => Some(track),
            _ => None,
        })
        .collect();
    assert_eq!(remote_tracks, vec!["peer-b-audio".to_string()]);
}

#[tokio::test]
async fn test_renegotiation_from_connected() {
    init_tracing();

    let mut a = ControllerHarness::new("peer-a").await;
    let mut b = ControllerHarness::new("peer-b").await;
    a.signal(SignalMessage::UserJoined(b.id.clone())).await;
    b.signal(SignalMessage::OtherUser(a.id.clone())).await;
    exchange(&mut a, &mut b).await;
    assert_eq!(a.state_of(&b.id), Some(NegotiationState::Connected));

    a.factory.engine(0).sink().negotiation_needed();
    a.drain().await;
    assert_eq!(a.state_of(&b.id), Some(NegotiationState::NegotiatingOffer));

    let from_a = a.sent();
    assert_eq!(count_op(&from_a, "offer"), 1);

    let from_b = deliver(from_a, &mut b).await;
    assert_eq!(count_op(&from_b, "answer"), 1);
    deliver(from_b, &mut a).await;

    assert_eq!(a.state_of(&b.id), Some(NegotiationState::Connected));
    assert_eq!(b.state_of(&a.id), Some(NegotiationState::Connected));
    // Renegotiation reuses the engines.
    assert_eq!(a.factory.engines().len(), 1);
    assert_eq!(b.factory.engines().len(), 1);
    assert_eq!(b.factory.engine(0).count(&EngineCall::AddTrack("audio".into())), 1);
}

#[tokio::test]
async fn test_answer_outside_offer_is_ignored() {
    init_tracing();

    let mut a = ControllerHarness::new("peer-a").await;
    let mut b = ControllerHarness::new("peer-b").await;
    b.signal(SignalMessage::OtherUser(a.id.clone())).await;

    a.signal(SignalMessage::UserJoined(b.id.clone())).await;
    let offer_round = deliver(a.sent(), &mut b).await;
    let answer = offer_round
        .into_iter()
        .find(|m| m.op() == "answer")
        .unwrap();

    // A stray answer to the callee must not change its state.
    let SignalMessage::Answer(mut stray) = answer.clone() else {
        unreachable!()
    };
    stray.target = b.id.clone();
    stray.caller = a.id.clone();
    b.signal(SignalMessage::Answer(stray)).await;
    assert_eq!(b.state_of(&a.id), Some(NegotiationState::Connected));
    assert_eq!(
        b.factory
            .engine(0)
            .count(&EngineCall::SetRemote(duet_core::SdpType::Answer)),
        0
    );
}
