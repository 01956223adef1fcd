mod media_sink;
mod pump;

pub use media_sink::*;
pub use pump::*;
