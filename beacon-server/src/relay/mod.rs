mod chunk_relay;

pub use chunk_relay::*;
