pub use beacon_core::{Chunk, RoomName, SessionId};

pub mod model {
    pub use beacon_core::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use beacon_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use beacon_client::*;
}

#[cfg(feature = "wasm")]
pub mod wasm {
    pub use beacon_wasm::*;
}
