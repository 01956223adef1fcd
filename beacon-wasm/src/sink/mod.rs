use beacon_client::{AppendError, MediaSink};
use wasm_bindgen::JsValue;
use web_sys::{MediaSource, MediaSourceReadyState, SourceBuffer, Url};

/// [`MediaSink`] over a browser `MediaSource` with a single `SourceBuffer`.
pub struct SourceBufferSink {
    media_source: MediaSource,
    source_buffer: Option<SourceBuffer>,
    object_url: String,
    /// Installed as `updateend` on the source buffer once it exists.
    on_update_end: js_sys::Function,
}

impl SourceBufferSink {
    pub fn new(on_update_end: js_sys::Function) -> Result<Self, JsValue> {
        let media_source = MediaSource::new()?;
        let object_url = Url::create_object_url_with_source(&media_source)?;
        Ok(Self {
            media_source,
            source_buffer: None,
            object_url,
            on_update_end,
        })
    }

    pub fn media_source(&self) -> &MediaSource {
        &self.media_source
    }

    /// What the video element's `src` must point at.
    pub fn object_url(&self) -> &str {
        &self.object_url
    }

    /// Detaches the handlers and frees the object URL.
    pub fn release(&self) {
        self.media_source.set_onsourceopen(None);
        if let Some(buffer) = &self.source_buffer {
            buffer.set_onupdateend(None);
        }
        let _ = Url::revoke_object_url(&self.object_url);
    }
}

fn error_name(err: &JsValue) -> String {
    js_sys::Reflect::get(err, &"name".into())
        .ok()
        .and_then(|name| name.as_string())
        .unwrap_or_else(|| format!("{:?}", err))
}

fn classify(err: JsValue) -> AppendError {
    let name = error_name(&err);
    match name.as_str() {
        "InvalidStateError" | "QuotaExceededError" => AppendError::Busy,
        "NotSupportedError" => AppendError::Unsupported(name),
        _ => AppendError::Rejected(name),
    }
}

impl MediaSink for SourceBufferSink {
    fn is_open(&self) -> bool {
        self.media_source.ready_state() == MediaSourceReadyState::Open
    }

    fn is_updating(&self) -> bool {
        self.source_buffer
            .as_ref()
            .is_some_and(|buffer| buffer.updating())
    }

    fn has_source_buffer(&self) -> bool {
        self.source_buffer.is_some()
    }

    fn add_source_buffer(&mut self, mime_type: &str) -> Result<(), AppendError> {
        if !MediaSource::is_type_supported(mime_type) {
            return Err(AppendError::Unsupported(mime_type.to_owned()));
        }

        let buffer = self
            .media_source
            .add_source_buffer(mime_type)
            .map_err(classify)?;
        buffer.set_onupdateend(Some(&self.on_update_end));
        self.source_buffer = Some(buffer);
        Ok(())
    }

    fn append(&mut self, bytes: &[u8]) -> Result<(), AppendError> {
        let Some(buffer) = &self.source_buffer else {
            return Err(AppendError::Busy);
        };

        let view = js_sys::Uint8Array::from(bytes);
        buffer
            .append_buffer_with_array_buffer_view(&view)
            .map_err(classify)
    }
}
