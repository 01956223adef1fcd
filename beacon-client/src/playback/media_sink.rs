use crate::error::AppendError;

/// A streaming playback sink, e.g. a browser `MediaSource` with one
/// `SourceBuffer`.
///
/// `append` starts an asynchronous append. The host reports its completion
/// through [`crate::PlaybackPump::on_append_complete`].
pub trait MediaSink {
    fn is_open(&self) -> bool;

    fn is_updating(&self) -> bool;

    fn has_source_buffer(&self) -> bool;

    fn add_source_buffer(&mut self, mime_type: &str) -> Result<(), AppendError>;

    fn append(&mut self, buffer: &[u8]) -> Result<(), AppendError>;
}
