use beacon_core::{ClientSignal, JoinRequest, Role, ServerSignal};

use super::{connect, spawn_relay, wait_for_chunk, wait_for_signal};
use crate::integration::{chunk, init_tracing, room};

#[tokio::test]
async fn test_welcome_advertises_session_and_ice_servers() {
    init_tracing();

    let (addr, state) = spawn_relay().await.expect("relay failed to start");
    let conn = connect(addr).await.expect("connect failed");

    assert_eq!(conn.ice_servers(), state.config.ice_servers.as_slice());
    assert!(state.signaling.is_connected(&conn.session_id()));

    conn.close().await.expect("close failed");
}

#[tokio::test]
async fn test_broadcast_reaches_a_viewer_over_websocket() {
    init_tracing();

    let (addr, _state) = spawn_relay().await.expect("relay failed to start");
    let r1 = room("r1");

    let mut broadcaster = connect(addr).await.expect("broadcaster connect failed");
    broadcaster
        .send(&ClientSignal::JoinRoom(JoinRequest {
            room: r1.clone(),
            role: Role::Broadcaster,
        }))
        .await
        .expect("join failed");
    wait_for_signal(&mut broadcaster, |s| matches!(s, ServerSignal::JoinedRoom { .. }))
        .await
        .expect("broadcaster not joined");

    broadcaster
        .send(&ClientSignal::LiveStarted(r1.clone()))
        .await
        .expect("live-started failed");

    let mut viewer = connect(addr).await.expect("viewer connect failed");
    viewer
        .send(&ClientSignal::JoinRoom(JoinRequest {
            room: r1.clone(),
            role: Role::Viewer,
        }))
        .await
        .expect("join failed");

    let joined = wait_for_signal(&mut viewer, |s| matches!(s, ServerSignal::JoinedRoom { .. }))
        .await
        .expect("viewer not joined");
    assert_eq!(
        joined,
        ServerSignal::JoinedRoom {
            room: r1.clone(),
            is_live: true
        }
    );

    let request = wait_for_signal(&mut broadcaster, |s| {
        matches!(s, ServerSignal::ViewerRequestedOffer(_))
    })
    .await
    .expect("no offer request");
    assert_eq!(request, ServerSignal::ViewerRequestedOffer(viewer.session_id()));

    broadcaster
        .send_chunk(&chunk(&r1, "1712", b"header"))
        .await
        .expect("chunk send failed");
    broadcaster
        .send_chunk(&chunk(&r1, "1713", b"media"))
        .await
        .expect("chunk send failed");

    let first = wait_for_chunk(&mut viewer).await.expect("no init chunk");
    let second = wait_for_chunk(&mut viewer).await.expect("no media chunk");
    assert!(first.is_init());
    assert_eq!(&first.payload[..], b"header");
    assert_eq!(second.id, "1713");

    broadcaster.close().await.expect("close failed");
    wait_for_signal(&mut viewer, |s| matches!(s, ServerSignal::LiveStopped(_)))
        .await
        .expect("viewer not told the stream ended");

    viewer.close().await.expect("close failed");
}

#[tokio::test]
async fn test_disconnect_removes_the_session() {
    init_tracing();

    let (addr, state) = spawn_relay().await.expect("relay failed to start");
    let mut viewer = connect(addr).await.expect("connect failed");
    let session = viewer.session_id();
    viewer
        .send(&ClientSignal::JoinRoom(JoinRequest {
            room: room("r1"),
            role: Role::Viewer,
        }))
        .await
        .expect("join failed");
    wait_for_signal(&mut viewer, |s| matches!(s, ServerSignal::JoinedRoom { .. }))
        .await
        .expect("viewer not joined");

    viewer.close().await.expect("close failed");

    for _ in 0..50 {
        if state.router.registry().session(&session).is_none() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert!(state.router.registry().session(&session).is_none());
    assert!(!state.signaling.is_connected(&session));
    assert_eq!(state.router.registry().room_count(), 0);
}
