use beacon_core::{Role, ServerSignal};

use crate::integration::{create_test_router, init_tracing, join_as, room};

fn joined_status(signals: &[ServerSignal]) -> Option<bool> {
    signals.iter().find_map(|signal| match signal {
        ServerSignal::JoinedRoom { is_live, .. } => Some(*is_live),
        _ => None,
    })
}

#[tokio::test]
async fn test_each_joiner_sees_the_live_status_at_its_join() {
    init_tracing();

    let (router, output) = create_test_router();
    let r1 = room("r1");

    let broadcaster = join_as(&router, &r1, Role::Broadcaster);
    let early = join_as(&router, &r1, Role::Viewer);

    router.live_started(broadcaster, &r1);
    let during = join_as(&router, &r1, Role::Viewer);

    router.live_stopped(broadcaster, &r1);
    let after = join_as(&router, &r1, Role::Viewer);

    router.live_started(broadcaster, &r1);
    let again = join_as(&router, &r1, Role::Viewer);

    assert_eq!(joined_status(&output.signals_for(&broadcaster)), Some(false));
    assert_eq!(joined_status(&output.signals_for(&early)), Some(false));
    assert_eq!(joined_status(&output.signals_for(&during)), Some(true));
    assert_eq!(joined_status(&output.signals_for(&after)), Some(false));
    assert_eq!(joined_status(&output.signals_for(&again)), Some(true));
}

#[tokio::test]
async fn test_joined_room_is_the_first_reply() {
    init_tracing();

    let (router, output) = create_test_router();
    let r1 = room("r1");
    let broadcaster = join_as(&router, &r1, Role::Broadcaster);
    router.live_started(broadcaster, &r1);

    let viewer = join_as(&router, &r1, Role::Viewer);

    let signals = output.signals_for(&viewer);
    assert!(matches!(
        signals.first(),
        Some(ServerSignal::JoinedRoom { is_live: true, .. })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_never_report_a_stale_status() {
    init_tracing();

    let (router, output) = create_test_router();
    let r1 = room("r1");
    let broadcaster = join_as(&router, &r1, Role::Broadcaster);
    router.live_started(broadcaster, &r1);

    let mut handles = Vec::new();
    for _ in 0..32 {
        let router = router.clone();
        let r1 = r1.clone();
        handles.push(tokio::spawn(async move { join_as(&router, &r1, Role::Viewer) }));
    }

    for handle in handles {
        let viewer = handle.await.unwrap();
        assert_eq!(joined_status(&output.signals_for(&viewer)), Some(true));
    }
    assert_eq!(router.registry().members(&r1).len(), 33);
}
