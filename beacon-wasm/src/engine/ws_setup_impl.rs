use beacon_core::{ClientSignal, JoinRequest, Role};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{BinaryType, MessageEvent, WebSocket};

use crate::ViewerEngine;
use crate::engine::ConnectionState;
use crate::logger::Logger;

impl ViewerEngine {
    pub(crate) fn ws_setup(&self, url: &str) -> Result<(), JsValue> {
        let ws = WebSocket::new(url)?;
        ws.set_binary_type(BinaryType::Arraybuffer);

        let onopen_callback = {
            let inner = self.inner.clone();
            Closure::<dyn FnMut(JsValue)>::wrap(Box::new(move |_| {
                Logger::info("WS open");

                let mut inner = inner.borrow_mut();
                let join = ClientSignal::JoinRoom(JoinRequest {
                    room: inner.room.clone(),
                    role: Role::Viewer,
                });
                let json = match serde_json::to_string(&join) {
                    Ok(json) => json,
                    Err(e) => {
                        Logger::warn(&format!("Join not encoded: {}", e));
                        return;
                    }
                };

                if let Some(ws) = &inner.ws {
                    if let Err(e) = ws.send_with_str(&json) {
                        Logger::error("Join not sent", &e);
                        return;
                    }
                }
                inner.state = inner.state.on_open();
            }))
        };
        ws.set_onopen(Some(onopen_callback.as_ref().unchecked_ref()));
        onopen_callback.forget();

        let onmessage_callback = {
            let inner = self.inner.clone();
            Closure::<dyn FnMut(MessageEvent)>::wrap(Box::new(move |e: MessageEvent| {
                let data = e.data();
                if let Some(text) = data.as_string() {
                    Self::handle_signal(&inner, &text);
                } else if let Ok(buffer) = data.dyn_into::<js_sys::ArrayBuffer>() {
                    let frame = js_sys::Uint8Array::new(&buffer).to_vec();
                    Self::handle_chunk(&inner, &frame);
                } else {
                    Logger::debug("Unexpected WS frame ignored");
                }
            }))
        };
        ws.set_onmessage(Some(onmessage_callback.as_ref().unchecked_ref()));
        onmessage_callback.forget();

        let onclose_callback = {
            let inner = self.inner.clone();
            Closure::<dyn FnMut(JsValue)>::wrap(Box::new(move |_| {
                Logger::info("WS closed");
                inner.borrow_mut().state = ConnectionState::Disconnected;
            }))
        };
        ws.set_onclose(Some(onclose_callback.as_ref().unchecked_ref()));
        onclose_callback.forget();

        let mut inner = self.inner.borrow_mut();
        inner.ws = Some(ws);
        inner.state = ConnectionState::Connecting;
        Ok(())
    }
}
