use beacon_client::{PlaybackPump, PumpConfig};

use crate::integration::{chunk, drain, init_tracing};
use crate::utils::MockSink;

#[tokio::test]
async fn test_full_queue_drops_the_oldest_media_buffer() {
    init_tracing();

    let mut sink = MockSink::open();
    sink.open = false;
    let mut pump = PlaybackPump::new(
        sink,
        PumpConfig {
            max_queued: 3,
            overflow_warn_every: 1,
        },
    );

    pump.on_chunk_received(chunk("init", b"h"));
    for seq in 1..=4u8 {
        pump.on_chunk_received(chunk(&seq.to_string(), &[seq]));
    }

    assert_eq!(pump.queue_len(), 3);
    assert_eq!(pump.dropped(), 2);

    pump.sink_mut().open = true;
    pump.on_sink_open();
    drain(&mut pump);

    assert_eq!(
        pump.sink().appended(),
        vec![b"h".to_vec(), vec![3u8], vec![4u8]]
    );
}

#[tokio::test]
async fn test_queue_length_tracks_pending_buffers() {
    init_tracing();

    let mut pump = PlaybackPump::new(MockSink::open(), PumpConfig::default());
    pump.on_chunk_received(chunk("init", b"h"));
    pump.on_chunk_received(chunk("1", b"a"));
    pump.on_chunk_received(chunk("2", b"b"));

    assert_eq!(pump.queue_len(), 2);
    drain(&mut pump);
    assert_eq!(pump.queue_len(), 0);
    assert_eq!(pump.dropped(), 0);
}
