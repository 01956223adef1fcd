mod peer_event;
mod webrtc_peer;

pub use peer_event::*;
pub use webrtc_peer::*;
