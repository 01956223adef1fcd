use crate::app::AppState;
use crate::signaling::{SignalingOutput, SignalingRouter, SignalingService};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use beacon_core::{ServerSignal, SessionId};
use futures::{SinkExt, StreamExt};
use tracing::{error, info, warn};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let max_bytes = state.config.max_message_bytes;

    ws.max_message_size(max_bytes)
        .max_frame_size(max_bytes)
        .on_upgrade(move |socket| handle_socket(socket, state.signaling, state.router))
}

async fn handle_socket(socket: WebSocket, signaling: SignalingService, router: SignalingRouter) {
    let session = SessionId::new();
    info!(session = %session, "New WebSocket connection");

    let (mut sender, mut receiver) = socket.split();
    let mut rx = signaling.add_peer(session);

    let welcome = ServerSignal::Welcome {
        session_id: session,
        ice_servers: signaling.get_ice_servers(),
    };
    if let Err(e) = signaling.send_signal(&session, welcome) {
        error!(session = %session, "Failed to greet session: {}", e);
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    let mut recv_task = tokio::spawn({
        let router = router.clone();

        async move {
            while let Some(msg) = receiver.next().await {
                match msg {
                    Ok(Message::Text(text)) => router.handle_text(session, text.as_str()),
                    Ok(Message::Binary(frame)) => router.handle_binary(session, &frame),
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!(session = %session, "WebSocket read failed: {}", e);
                        break;
                    }
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    signaling.remove_peer(&session);
    router.disconnect(session);
    info!(session = %session, "WebSocket disconnected");
}
