mod broadcaster;
mod candidates;
mod peer_transport;
mod viewer;

pub use broadcaster::*;
pub use candidates::*;
pub use peer_transport::*;
pub use viewer::*;
