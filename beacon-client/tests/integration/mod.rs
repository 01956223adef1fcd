
use beacon_client::{PlaybackPump, PumpConfig};
use beacon_core::{Chunk, RoomName};
use tracing::Level;

use crate::utils::MockSink;

pub const MIME: &str = "video/webm;codecs=vp8";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn chunk(id: &str, payload: &[u8]) -> Chunk {
    Chunk::new(
        id,
        RoomName::new("r1").expect("valid room"),
        MIME,
        payload.to_vec(),
    )
}

pub fn open_pump() -> PlaybackPump<MockSink> {
    PlaybackPump::new(MockSink::open(), PumpConfig::default())
}

/// Completes in-flight appends until the pump runs dry.
pub fn drain(pump: &mut PlaybackPump<MockSink>) {
    while pump.sink().updating {
        pump.sink_mut().finish_append();
        pump.on_append_complete();
    }
}
