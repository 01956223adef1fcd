use beacon_core::{Role, ServerSignal};
use beacon_server::PublishOutcome;

use crate::integration::{chunk, create_test_router, init_tracing, join_as, room};
use crate::utils::Outbound;

#[tokio::test]
async fn test_viewer_joining_before_the_first_chunk_gets_no_init() {
    init_tracing();

    let (router, output) = create_test_router();
    let r1 = room("r1");
    let _broadcaster = join_as(&router, &r1, Role::Broadcaster);
    router.registry().mark_live(&r1);

    let viewer = join_as(&router, &r1, Role::Viewer);

    assert!(matches!(
        output.signals_for(&viewer).first(),
        Some(ServerSignal::JoinedRoom { is_live: true, .. })
    ));
    assert!(output.chunks_for(&viewer).is_empty());
    assert_eq!(router.relay().on_join(&r1), None);
}

#[tokio::test]
async fn test_first_chunk_of_a_live_session_becomes_the_init_segment() {
    init_tracing();

    let (router, output) = create_test_router();
    let r1 = room("r1");
    let broadcaster = join_as(&router, &r1, Role::Broadcaster);
    router.live_started(broadcaster, &r1);
    let viewer = join_as(&router, &r1, Role::Viewer);

    let outcome = router.publish_chunk(broadcaster, chunk(&r1, "1712000000", b"header"));

    assert_eq!(
        outcome,
        Some(PublishOutcome::Delivered {
            recipients: 1,
            init: true
        })
    );
    let received = output.chunks_for(&viewer);
    assert_eq!(received.len(), 1);
    assert!(received[0].is_init());
    assert_eq!(&received[0].payload[..], b"header");
    assert_eq!(router.relay().on_join(&r1).map(|c| c.payload), Some(received[0].payload.clone()));
}

#[tokio::test]
async fn test_late_joiner_gets_init_before_any_later_chunk() {
    init_tracing();

    let (router, output) = create_test_router();
    let r1 = room("r1");
    let broadcaster = join_as(&router, &r1, Role::Broadcaster);
    router.live_started(broadcaster, &r1);

    router.publish_chunk(broadcaster, chunk(&r1, "init", b"header"));
    router.publish_chunk(broadcaster, chunk(&r1, "1", b"one"));

    let late = join_as(&router, &r1, Role::Viewer);
    router.publish_chunk(broadcaster, chunk(&r1, "2", b"two"));

    let outbound = output.outbound_for(&late);
    assert!(matches!(
        outbound.first(),
        Some(Outbound::Signal {
            signal: ServerSignal::JoinedRoom { .. },
            ..
        })
    ));
    let ids: Vec<String> = output.chunks_for(&late).into_iter().map(|c| c.id).collect();
    assert_eq!(ids, vec!["init", "2"]);
    assert!(matches!(outbound.get(1), Some(Outbound::Frame { chunk, .. }) if chunk.is_init()));
}

#[tokio::test]
async fn test_ended_session_never_mixes_init_segments() {
    init_tracing();

    let (router, output) = create_test_router();
    let r1 = room("r1");
    let broadcaster = join_as(&router, &r1, Role::Broadcaster);
    router.live_started(broadcaster, &r1);
    router.publish_chunk(broadcaster, chunk(&r1, "init", b"old-header"));

    router.registry().mark_ended(&r1);
    assert_eq!(router.relay().on_join(&r1), None);
    assert!(
        router
            .registry()
            .inspect(&r1, |room| room.init_segment().is_none())
            .unwrap()
    );

    router.registry().mark_live(&r1);
    router.publish_chunk(broadcaster, chunk(&r1, "9", b"new-header"));

    let fresh = router.relay().on_join(&r1).unwrap();
    assert!(fresh.is_init());
    assert_eq!(&fresh.payload[..], b"new-header");

    let viewer = join_as(&router, &r1, Role::Viewer);
    let received = output.chunks_for(&viewer);
    assert_eq!(received.len(), 1);
    assert_eq!(&received[0].payload[..], b"new-header");
}

#[tokio::test]
async fn test_recorder_restart_replaces_the_init_segment() {
    init_tracing();

    let (router, _output) = create_test_router();
    let r1 = room("r1");
    let broadcaster = join_as(&router, &r1, Role::Broadcaster);
    router.live_started(broadcaster, &r1);

    router.publish_chunk(broadcaster, chunk(&r1, "init", b"first"));
    router.publish_chunk(broadcaster, chunk(&r1, "1", b"media"));
    let outcome = router.publish_chunk(broadcaster, chunk(&r1, "init", b"second"));

    assert_eq!(
        outcome,
        Some(PublishOutcome::Delivered {
            recipients: 0,
            init: true
        })
    );
    assert_eq!(&router.relay().on_join(&r1).unwrap().payload[..], b"second");
}

#[tokio::test]
async fn test_reconfirming_live_keeps_the_init_segment() {
    init_tracing();

    let (router, _output) = create_test_router();
    let r1 = room("r1");
    let broadcaster = join_as(&router, &r1, Role::Broadcaster);
    router.live_started(broadcaster, &r1);
    router.publish_chunk(broadcaster, chunk(&r1, "init", b"header"));

    router.live_started(broadcaster, &r1);
    assert!(!router.registry().mark_live(&r1));

    assert!(router.relay().on_join(&r1).is_some());
}
