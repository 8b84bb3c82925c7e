pub mod constants;
pub mod cursor;
pub mod dissector;
pub mod error;
pub mod registry;

pub use dissector::{Dissection, Dissector, Termination};
pub use error::{DecodeError, DecodeFailure};
pub use registry::{ApplicationProtocol, NetworkProtocol, TransportProtocol};
