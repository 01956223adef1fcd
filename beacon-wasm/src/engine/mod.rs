use beacon_client::{PlaybackPump, PumpConfig};
use beacon_core::{RoomName, ServerSignal, SessionId};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlVideoElement, WebSocket};

use crate::logger::Logger;
use crate::sink::SourceBufferSink;

mod handle_chunk_impl;
mod handle_signal_impl;
mod sink_setup_impl;
mod ws_setup_impl;

/// Viewer session state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConnectionState {
    Disconnected,
    /// Socket created, not open yet.
    Connecting,
    /// `join-room` sent, waiting for the relay's answer.
    Joining,
    Joined,
    Rejected,
}

impl ConnectionState {
    fn on_open(self) -> Self {
        match self {
            ConnectionState::Connecting => ConnectionState::Joining,
            other => other,
        }
    }

    fn on_signal(self, signal: &ServerSignal) -> Self {
        match signal {
            ServerSignal::JoinedRoom { .. } => ConnectionState::Joined,
            ServerSignal::JoinRejected { .. } => ConnectionState::Rejected,
            _ => self,
        }
    }
}

/// Handlers owned by the current sink. Replacing them on a reset drops the
/// previous pair.
struct SinkClosures {
    _update_end: Closure<dyn FnMut(JsValue)>,
    _source_open: Closure<dyn FnMut(JsValue)>,
}

struct EngineInner {
    state: ConnectionState,
    room: RoomName,
    session_id: Option<SessionId>,
    ws: Option<WebSocket>,
    video: HtmlVideoElement,
    pump: Option<PlaybackPump<SourceBufferSink>>,
    sink_closures: Option<SinkClosures>,
    js_callback: Option<js_sys::Function>,
}

/// Watches one room's chunk stream in a `<video>` element through Media
/// Source Extensions.
#[wasm_bindgen]
pub struct ViewerEngine {
    inner: Rc<RefCell<EngineInner>>,
}

#[wasm_bindgen]
impl ViewerEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(url: &str, room: &str, video: HtmlVideoElement) -> Result<ViewerEngine, JsValue> {
        let room = RoomName::new(room).map_err(|e| JsValue::from_str(&e.to_string()))?;

        let inner = Rc::new(RefCell::new(EngineInner {
            state: ConnectionState::Disconnected,
            room,
            session_id: None,
            ws: None,
            video,
            pump: None,
            sink_closures: None,
            js_callback: None,
        }));

        let engine = ViewerEngine { inner };
        Self::sink_setup(&engine.inner)?;
        engine.ws_setup(url)?;
        Ok(engine)
    }

    /// `callback` receives every relay signal as a plain JS object.
    #[wasm_bindgen(js_name = setEventHandler)]
    pub fn set_event_handler(&self, callback: js_sys::Function) {
        self.inner.borrow_mut().js_callback = Some(callback);
    }

    #[wasm_bindgen(js_name = sessionId)]
    pub fn session_id(&self) -> Option<String> {
        self.inner.borrow().session_id.map(|id| id.to_string())
    }

    #[wasm_bindgen(js_name = isJoined)]
    pub fn is_joined(&self) -> bool {
        self.inner.borrow().state == ConnectionState::Joined
    }

    #[wasm_bindgen(js_name = queueLength)]
    pub fn queue_len(&self) -> usize {
        self.inner
            .borrow()
            .pump
            .as_ref()
            .map_or(0, |pump| pump.queue_len())
    }

    /// Buffers discarded because playback fell behind.
    pub fn dropped(&self) -> f64 {
        self.inner
            .borrow()
            .pump
            .as_ref()
            .map_or(0.0, |pump| pump.dropped() as f64)
    }

    /// Drops everything buffered and starts over on a fresh `MediaSource`.
    pub fn reset(&self) -> Result<(), JsValue> {
        Self::sink_setup(&self.inner)
    }

    pub fn close(&self) {
        let mut inner = self.inner.borrow_mut();
        if let Some(ws) = inner.ws.take() {
            ws.set_onopen(None);
            ws.set_onmessage(None);
            ws.set_onclose(None);
            let _ = ws.close();
        }
        if let Some(pump) = &inner.pump {
            pump.sink().release();
        }
        inner.sink_closures = None;
        inner.state = ConnectionState::Disconnected;
        Logger::info("Viewer closed");
    }
}

impl ViewerEngine {
    fn default_pump(sink: SourceBufferSink) -> PlaybackPump<SourceBufferSink> {
        PlaybackPump::new(sink, PumpConfig::default())
    }

    fn dispatch_event<T: serde::Serialize>(inner: &Rc<RefCell<EngineInner>>, event: &T) {
        // The callback may call back into the engine.
        let callback = inner.borrow().js_callback.clone();
        let Some(callback) = callback else {
            return;
        };

        match serde_wasm_bindgen::to_value(event) {
            Ok(value) => {
                if let Err(e) = callback.call1(&JsValue::NULL, &value) {
                    Logger::error("Event handler threw", &e);
                }
            }
            Err(e) => Logger::warn(&format!("Event not converted: {}", e)),
        }
    }
}
