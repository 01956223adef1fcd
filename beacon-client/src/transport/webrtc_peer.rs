use crate::negotiation::{PeerFactory, PeerTransport};
use crate::transport::PeerEvent;
use anyhow::{Context, Result};
use async_trait::async_trait;
use beacon_core::{IceServerConfig, SessionId};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;

/// [`PeerTransport`] over a webrtc-rs peer connection. Media tracks are the
/// host's business and go through [`WebrtcPeer::peer_connection`].
pub struct WebrtcPeer {
    pub remote: SessionId,
    pub peer_connection: Arc<RTCPeerConnection>,
}

impl WebrtcPeer {
    pub async fn new(
        remote: SessionId,
        ice_servers: &[IceServerConfig],
        event_tx: mpsc::Sender<PeerEvent>,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        let state_tx = event_tx.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();

                Box::pin(async move {
                    info!(session = %remote, "Peer connection state: {:?}", s);
                    let event = match s {
                        RTCPeerConnectionState::Connected => PeerEvent::Connected(remote),
                        RTCPeerConnectionState::Failed
                        | RTCPeerConnectionState::Disconnected
                        | RTCPeerConnectionState::Closed => PeerEvent::Disconnected(remote),
                        _ => return,
                    };
                    let _ = tx.send(event).await;
                })
            },
        ));

        let ice_tx = event_tx;
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let Ok(value) = serde_json::to_value(&init) else {
                    return;
                };
                let _ = tx.send(PeerEvent::CandidateGenerated(remote, value)).await;
            })
        }));

        Ok(Self {
            remote,
            peer_connection,
        })
    }

    pub fn peer_connection(&self) -> &Arc<RTCPeerConnection> {
        &self.peer_connection
    }

    async fn local_description(&self, description: RTCSessionDescription) -> Result<Value> {
        self.peer_connection
            .set_local_description(description.clone())
            .await?;
        serde_json::to_value(&description).context("Failed to serialize session description")
    }
}

#[async_trait]
impl PeerTransport for WebrtcPeer {
    async fn create_offer(&self) -> Result<Value> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.local_description(offer).await
    }

    async fn create_answer(&self) -> Result<Value> {
        let answer = self.peer_connection.create_answer(None).await?;
        self.local_description(answer).await
    }

    async fn set_remote_description(&self, description: Value) -> Result<()> {
        let description: RTCSessionDescription =
            serde_json::from_value(description).context("Failed to parse session description")?;
        self.peer_connection
            .set_remote_description(description)
            .await?;
        Ok(())
    }

    /// Accepts a full candidate object or, from older senders, the bare
    /// candidate line.
    async fn add_ice_candidate(&self, candidate: Value) -> Result<()> {
        let candidate = match candidate {
            Value::String(line) => RTCIceCandidateInit {
                candidate: line,
                ..Default::default()
            },
            other => serde_json::from_value(other).context("Failed to parse ICE candidate")?,
        };
        self.peer_connection.add_ice_candidate(candidate).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

/// Creates the broadcaster's per-viewer peers with one send-only video
/// transceiver each.
#[derive(Clone)]
pub struct WebrtcPeerFactory {
    ice_servers: Vec<IceServerConfig>,
    event_tx: mpsc::Sender<PeerEvent>,
}

impl WebrtcPeerFactory {
    pub fn new(ice_servers: Vec<IceServerConfig>, event_tx: mpsc::Sender<PeerEvent>) -> Self {
        Self {
            ice_servers,
            event_tx,
        }
    }
}

#[async_trait]
impl PeerFactory for WebrtcPeerFactory {
    type Peer = WebrtcPeer;

    async fn create_peer(&self, viewer: SessionId) -> Result<WebrtcPeer> {
        let peer = WebrtcPeer::new(viewer, &self.ice_servers, self.event_tx.clone()).await?;
        peer.peer_connection
            .add_transceiver_from_kind(
                RTPCodecType::Video,
                Some(RTCRtpTransceiverInit {
                    direction: RTCRtpTransceiverDirection::Sendonly,
                    send_encodings: Vec::new(),
                }),
            )
            .await
            .context("Failed to add video transceiver")?;
        Ok(peer)
    }
}
