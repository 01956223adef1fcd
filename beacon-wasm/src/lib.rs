mod engine;
mod logger;
mod sink;

pub use engine::ViewerEngine;
pub use sink::SourceBufferSink;
