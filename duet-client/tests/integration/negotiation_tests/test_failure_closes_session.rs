use crate::integration::init_tracing;
use crate::utils::{ControllerHarness, EngineCall, count_op, deliver};
use duet_client::{ControllerEvent, NegotiationState};
use duet_core::{NegotiationSignal, SignalMessage};
use serde_json::json;

#[tokio::test]
async fn test_rejected_offer_closes_session_without_retry() {
    init_tracing();

    let mut a = ControllerHarness::new("peer-a").await;
    let mut b = ControllerHarness::new("peer-b").await;
    b.factory.fail_remote_descriptions();

    a.signal(SignalMessage::UserJoined(b.id.clone())).await;
    let offer = a.sent().remove(0);
    let from_b = deliver(vec![offer], &mut b).await;

    assert_eq!(count_op(&from_b, "answer"), 0);
    assert_eq!(b.state_of(&a.id), None);

    let engine = b.factory.engine(0);
    assert!(engine.is_closed());
    assert_eq!(engine.count(&EngineCall::CreateAnswer), 0);
    assert_eq!(b.factory.engines().len(), 1);

    let closed = b.events().into_iter().any(|e| {
        matches!(
            e,
            ControllerEvent::StateChanged { ref remote, state: NegotiationState::Closed } if *remote == a.id
        )
    });
    assert!(closed);
}

#[tokio::test]
async fn test_rejected_answer_closes_caller_session() {
    init_tracing();

    let mut a = ControllerHarness::new("peer-a").await;
    let mut b = ControllerHarness::new("peer-b").await;
    a.factory.fail_remote_descriptions();

    a.signal(SignalMessage::UserJoined(b.id.clone())).await;
    let from_b = deliver(a.sent(), &mut b).await;
    let answer = from_b.into_iter().find(|m| m.op() == "answer").unwrap();
    let back = deliver(vec![answer], &mut a).await;

    assert!(back.is_empty());
    assert_eq!(a.state_of(&b.id), None);
    assert!(a.factory.engine(0).is_closed());
}

#[tokio::test]
async fn test_malformed_offer_is_ignored() {
    init_tracing();

    let mut b = ControllerHarness::new("peer-b").await;
    let a = duet_core::PeerId::from("peer-a");
    b.signal(SignalMessage::OtherUser(a.clone())).await;

    b.signal(SignalMessage::Offer(NegotiationSignal {
        target: b.id.clone(),
        caller: a.clone(),
        sdp: json!({"sdp": "missing type"}),
    }))
    .await;

    assert_eq!(b.state_of(&a), Some(NegotiationState::Idle));
    assert!(b.factory.engines().is_empty());
    assert!(b.sent().is_empty());
}
