use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::ViewerEngine;
use crate::engine::{EngineInner, SinkClosures};
use crate::logger::Logger;
use crate::sink::SourceBufferSink;

impl ViewerEngine {
    /// Creates a fresh `MediaSource`, points the video element at it and
    /// swaps it into the pump. Any previous source is released.
    pub(crate) fn sink_setup(inner_rc: &Rc<RefCell<EngineInner>>) -> Result<(), JsValue> {
        let onupdateend_callback = {
            let inner = inner_rc.clone();
            Closure::<dyn FnMut(JsValue)>::wrap(Box::new(move |_| {
                Self::on_update_end(&inner);
            }))
        };
        let on_update_end: &js_sys::Function = onupdateend_callback.as_ref().unchecked_ref();
        let sink = SourceBufferSink::new(on_update_end.clone())?;

        let onsourceopen_callback = {
            let inner = inner_rc.clone();
            Closure::<dyn FnMut(JsValue)>::wrap(Box::new(move |_| {
                Logger::debug("MediaSource open");
                if let Some(pump) = inner.borrow_mut().pump.as_mut() {
                    pump.on_sink_open();
                }
            }))
        };
        sink.media_source()
            .set_onsourceopen(Some(onsourceopen_callback.as_ref().unchecked_ref()));

        let mut inner = inner_rc.borrow_mut();
        inner.video.set_src(sink.object_url());

        match inner.pump.as_mut() {
            Some(pump) => {
                pump.reset_sink(sink).release();
            }
            None => inner.pump = Some(Self::default_pump(sink)),
        }
        // The old sink's handlers were detached by `release`.
        inner.sink_closures = Some(SinkClosures {
            _update_end: onupdateend_callback,
            _source_open: onsourceopen_callback,
        });
        Ok(())
    }

    fn on_update_end(inner_rc: &Rc<RefCell<EngineInner>>) {
        let play = {
            let mut inner = inner_rc.borrow_mut();
            let Some(pump) = inner.pump.as_mut() else {
                return;
            };
            pump.on_append_complete();
            pump.should_start_playback()
        };

        if !play {
            return;
        }

        let video = inner_rc.borrow().video.clone();
        match video.play() {
            Ok(promise) => wasm_bindgen_futures::spawn_local(async move {
                if let Err(e) = JsFuture::from(promise).await {
                    Logger::error("Autoplay blocked", &e);
                }
            }),
            Err(e) => Logger::error("Playback not started", &e),
        }
    }
}
