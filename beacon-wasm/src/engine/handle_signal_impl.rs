use beacon_core::ServerSignal;
use std::cell::RefCell;
use std::rc::Rc;

use crate::ViewerEngine;
use crate::engine::EngineInner;
use crate::logger::Logger;

impl ViewerEngine {
    pub(super) fn handle_signal(inner_rc: &Rc<RefCell<EngineInner>>, text: &str) {
        let signal: ServerSignal = match serde_json::from_str(text) {
            Ok(signal) => signal,
            Err(e) => {
                Logger::warn(&format!("JSON Error: {}. Text: {}", e, text));
                return;
            }
        };

        {
            let mut inner = inner_rc.borrow_mut();
            inner.state = inner.state.on_signal(&signal);
        }

        match &signal {
            ServerSignal::Welcome { session_id, .. } => {
                Logger::info(&format!("Welcome, session {}", session_id));
                inner_rc.borrow_mut().session_id = Some(*session_id);
            }

            ServerSignal::JoinedRoom { room, is_live } => {
                Logger::info(&format!("Joined {} (live: {})", room, is_live));
            }

            ServerSignal::JoinRejected { room, reason } => {
                Logger::warn(&format!("Join to {} rejected: {}", room, reason));
            }

            ServerSignal::LiveStarted(room) => {
                Logger::info(&format!("{} is live", room));
            }

            ServerSignal::LiveStopped(room) => {
                Logger::info(&format!("{} stopped, resetting playback", room));
                if let Err(e) = Self::sink_setup(inner_rc) {
                    Logger::error("Playback reset failed", &e);
                }
            }

            // Negotiation is left to native peers.
            _ => {}
        }

        Self::dispatch_event(inner_rc, &signal);
    }
}
