use crate::error::AppendError;
use crate::playback::MediaSink;
use beacon_core::Chunk;
use bytes::Bytes;
use std::collections::VecDeque;
use tracing::{debug, error, warn};

pub const DEFAULT_MAX_QUEUED: usize = 256;
pub const DEFAULT_OVERFLOW_WARN_EVERY: u64 = 32;

#[derive(Debug, Clone)]
pub struct PumpConfig {
    /// Buffers held while the sink is busy or not yet open.
    pub max_queued: usize,
    /// Log one warning per this many dropped buffers.
    pub overflow_warn_every: u64,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            max_queued: DEFAULT_MAX_QUEUED,
            overflow_warn_every: DEFAULT_OVERFLOW_WARN_EVERY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    Idle,
    Appending,
    /// The sink cannot play this stream. Only [`PlaybackPump::reset_sink`]
    /// leaves this state.
    Failed,
}

#[derive(Debug)]
struct QueuedBuffer {
    bytes: Bytes,
    init: bool,
}

/// Appends received chunks into a [`MediaSink`] one at a time, in arrival
/// order, and only while the sink is idle.
pub struct PlaybackPump<S> {
    sink: S,
    config: PumpConfig,
    queue: VecDeque<QueuedBuffer>,
    state: PumpState,
    mime_type: Option<String>,
    dropped: u64,
    appended: u64,
    playback_started: bool,
}

impl<S: MediaSink> PlaybackPump<S> {
    pub fn new(sink: S, config: PumpConfig) -> Self {
        Self {
            sink,
            config,
            queue: VecDeque::new(),
            state: PumpState::Idle,
            mime_type: None,
            dropped: 0,
            appended: 0,
            playback_started: false,
        }
    }

    pub fn state(&self) -> PumpState {
        self.state
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Buffers discarded because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn appended(&self) -> u64 {
        self.appended
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn on_chunk_received(&mut self, chunk: Chunk) {
        if self.mime_type.is_none() {
            debug!("Stream mime type: {}", chunk.mime_type);
            self.mime_type = Some(chunk.mime_type.clone());
        }

        let buffer = QueuedBuffer {
            init: chunk.is_init(),
            bytes: chunk.payload,
        };
        self.enqueue(buffer);
        self.pump();
    }

    /// The sink finished opening; queued buffers can start flowing.
    pub fn on_sink_open(&mut self) {
        self.pump();
    }

    /// The sink finished the in-flight append or reports it can take more.
    /// Either way the next queued buffer goes out.
    pub fn on_append_complete(&mut self) {
        if self.state == PumpState::Appending {
            self.state = PumpState::Idle;
            self.appended += 1;
        }
        self.pump();
    }

    /// `true` exactly once, after the first buffer has landed in the sink.
    pub fn should_start_playback(&mut self) -> bool {
        if self.playback_started || self.appended == 0 {
            return false;
        }
        self.playback_started = true;
        true
    }

    /// Swaps in a fresh sink and starts over. Returns the old sink.
    pub fn reset_sink(&mut self, sink: S) -> S {
        self.queue.clear();
        self.state = PumpState::Idle;
        self.mime_type = None;
        self.appended = 0;
        self.playback_started = false;
        std::mem::replace(&mut self.sink, sink)
    }

    /// Starts at most one append. Returns whether one was started.
    pub fn pump(&mut self) -> bool {
        if self.state != PumpState::Idle
            || self.queue.is_empty()
            || !self.sink.is_open()
            || self.sink.is_updating()
        {
            return false;
        }

        if !self.sink.has_source_buffer() && !self.open_source_buffer() {
            return false;
        }

        let Some(buffer) = self.queue.pop_front() else {
            return false;
        };

        self.state = PumpState::Appending;
        match self.sink.append(&buffer.bytes) {
            Ok(()) => true,
            Err(AppendError::Busy) => {
                self.queue.push_front(buffer);
                self.state = PumpState::Idle;
                false
            }
            Err(AppendError::Rejected(reason)) => {
                warn!("Buffer rejected by sink, discarded: {}", reason);
                self.state = PumpState::Idle;
                false
            }
            Err(AppendError::Unsupported(reason)) => {
                self.fail(&reason);
                false
            }
        }
    }

    fn open_source_buffer(&mut self) -> bool {
        let Some(mime_type) = self.mime_type.clone() else {
            return false;
        };

        match self.sink.add_source_buffer(&mime_type) {
            Ok(()) => true,
            Err(AppendError::Unsupported(reason)) => {
                self.fail(&reason);
                false
            }
            Err(e) => {
                debug!("Source buffer not ready: {}", e);
                false
            }
        }
    }

    fn enqueue(&mut self, buffer: QueuedBuffer) {
        if self.queue.len() >= self.config.max_queued.max(1) {
            let victim = self
                .queue
                .iter()
                .position(|queued| !queued.init)
                .unwrap_or(0);
            self.queue.remove(victim);
            self.dropped += 1;

            if (self.dropped - 1) % self.config.overflow_warn_every.max(1) == 0 {
                warn!(
                    dropped = self.dropped,
                    "Playback queue full, dropping oldest buffers"
                );
            }
        }
        self.queue.push_back(buffer);
    }

    fn fail(&mut self, reason: &str) {
        error!("Playback failed, sink needs a reset: {}", reason);
        self.state = PumpState::Failed;
        self.queue.clear();
    }
}
