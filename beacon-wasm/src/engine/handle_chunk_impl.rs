use beacon_client::PumpState;
use beacon_core::Chunk;
use std::cell::RefCell;
use std::rc::Rc;

use crate::ViewerEngine;
use crate::engine::EngineInner;
use crate::logger::Logger;

impl ViewerEngine {
    pub(super) fn handle_chunk(inner_rc: &Rc<RefCell<EngineInner>>, frame: &[u8]) {
        let chunk = match Chunk::decode(frame) {
            Ok(chunk) => chunk,
            Err(e) => {
                Logger::warn(&format!("Chunk not decoded: {}", e));
                return;
            }
        };

        let mut inner = inner_rc.borrow_mut();
        if chunk.room != inner.room {
            Logger::debug(&format!("Chunk for {} ignored", chunk.room));
            return;
        }

        let Some(pump) = inner.pump.as_mut() else {
            return;
        };
        if pump.state() == PumpState::Failed {
            Logger::debug("Playback failed, chunk ignored until reset");
            return;
        }
        pump.on_chunk_received(chunk);
    }
}
