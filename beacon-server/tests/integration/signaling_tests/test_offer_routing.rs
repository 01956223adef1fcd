use beacon_core::{RelayEnvelope, Role, RoomName, ServerSignal, SessionId};
use beacon_server::{PairState, SignalingRouter};
use serde_json::json;

use crate::integration::{create_test_router, init_tracing, join_as, room};
use crate::utils::MockSignalingOutput;

struct LiveRoom {
    router: SignalingRouter,
    output: MockSignalingOutput,
    room: RoomName,
    broadcaster: SessionId,
    viewer: SessionId,
}

fn live_room_with_viewer() -> LiveRoom {
    let (router, output) = create_test_router();
    let r1 = room("r1");
    let broadcaster = join_as(&router, &r1, Role::Broadcaster);
    router.live_started(broadcaster, &r1);
    let viewer = join_as(&router, &r1, Role::Viewer);
    LiveRoom {
        router,
        output,
        room: r1,
        broadcaster,
        viewer,
    }
}

fn pair_state(live: &LiveRoom) -> PairState {
    live.router
        .registry()
        .inspect(&live.room, |room| room.pair_state(&live.viewer))
        .unwrap()
}

fn unaddressed(payload: serde_json::Value) -> RelayEnvelope {
    RelayEnvelope {
        from: None,
        to: None,
        payload,
    }
}

#[tokio::test]
async fn test_full_negotiation_between_broadcaster_and_viewer() {
    init_tracing();

    let live = live_room_with_viewer();
    assert_eq!(live.output.offer_requests_for(&live.broadcaster), vec![live.viewer]);
    assert_eq!(pair_state(&live), PairState::OfferRequested);

    let offer = json!({"type": "offer", "sdp": "v=0 offer"});
    live.router
        .route_offer(live.broadcaster, RelayEnvelope::to(live.viewer, offer.clone()));
    assert_eq!(pair_state(&live), PairState::OfferSent);
    assert!(live.output.signals_for(&live.viewer).contains(&ServerSignal::WebrtcOffer(
        RelayEnvelope {
            from: Some(live.broadcaster),
            to: Some(live.viewer),
            payload: offer,
        }
    )));

    // Candidates may overtake the answer.
    live.router
        .route_ice(live.viewer, unaddressed(json!({"candidate": "candidate:1"})));

    let answer = json!({"type": "answer", "sdp": "v=0 answer"});
    live.router.route_answer(live.viewer, unaddressed(answer.clone()));
    assert_eq!(pair_state(&live), PairState::Answered);

    live.router.route_ice(
        live.broadcaster,
        RelayEnvelope::to(live.viewer, json!({"candidate": "candidate:2"})),
    );

    let to_broadcaster = live.output.signals_for(&live.broadcaster);
    assert!(to_broadcaster.contains(&ServerSignal::WebrtcAnswer(RelayEnvelope {
        from: Some(live.viewer),
        to: Some(live.broadcaster),
        payload: answer,
    })));
    assert!(to_broadcaster.iter().any(|signal| matches!(
        signal,
        ServerSignal::WebrtcIce(envelope) if envelope.from == Some(live.viewer)
    )));
    assert!(live.output.signals_for(&live.viewer).iter().any(|signal| matches!(
        signal,
        ServerSignal::WebrtcIce(envelope) if envelope.from == Some(live.broadcaster)
    )));

    live.router.peer_connected(live.viewer, unaddressed(serde_json::Value::Null));
    assert_eq!(pair_state(&live), PairState::Connected);
}

#[tokio::test]
async fn test_only_one_offer_is_outstanding_per_pair() {
    init_tracing();

    let live = live_room_with_viewer();

    live.router.request_offer(live.viewer);
    live.router.request_offer(live.viewer);
    assert_eq!(live.output.offer_requests_for(&live.broadcaster).len(), 1);

    let offer = || RelayEnvelope::to(live.viewer, json!({"sdp": "offer"}));
    live.router.route_offer(live.broadcaster, offer());
    live.router.route_offer(live.broadcaster, offer());
    live.router.request_offer(live.viewer);

    let offers = live
        .output
        .signals_for(&live.viewer)
        .into_iter()
        .filter(|signal| matches!(signal, ServerSignal::WebrtcOffer(_)))
        .count();
    assert_eq!(offers, 1);
    assert_eq!(live.output.offer_requests_for(&live.broadcaster).len(), 1);
}

#[tokio::test]
async fn test_out_of_order_messages_are_dropped() {
    init_tracing();

    let live = live_room_with_viewer();
    live.output.clear();

    live.router.route_answer(live.viewer, unaddressed(json!({"sdp": "early"})));
    live.router.route_ice(live.viewer, unaddressed(json!({"candidate": "early"})));

    assert!(live.output.signals_for(&live.broadcaster).is_empty());
    assert_eq!(pair_state(&live), PairState::OfferRequested);
}

#[tokio::test]
async fn test_messages_only_flow_along_the_pair() {
    init_tracing();

    let live = live_room_with_viewer();
    let other_viewer = join_as(&live.router, &live.room, Role::Viewer);
    let outsider = join_as(&live.router, &room("elsewhere"), Role::Viewer);
    live.output.clear();

    // Viewers cannot offer, and offers never leave the room.
    live.router
        .route_offer(live.viewer, RelayEnvelope::to(other_viewer, json!("offer")));
    live.router
        .route_offer(live.broadcaster, RelayEnvelope::to(outsider, json!("offer")));
    // Viewers cannot address each other.
    live.router
        .route_answer(other_viewer, RelayEnvelope::to(live.viewer, json!("answer")));
    // Broadcaster candidates need an explicit viewer.
    live.router
        .route_ice(live.broadcaster, unaddressed(json!("candidate")));

    for session in [live.viewer, other_viewer, outsider, live.broadcaster] {
        assert!(live.output.signals_for(&session).is_empty());
    }
}

#[tokio::test]
async fn test_unreachable_targets_are_dropped_silently() {
    init_tracing();

    let live = live_room_with_viewer();
    live.output.set_offline(live.viewer);

    live.router
        .route_offer(live.broadcaster, RelayEnvelope::to(live.viewer, json!("offer")));

    assert!(live.output.signals_for(&live.viewer).is_empty());
    assert_eq!(pair_state(&live), PairState::OfferRequested);
}
