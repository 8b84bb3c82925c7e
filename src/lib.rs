//! Layered dissection of captured Ethernet frames.
//!
//! A [`Dissector`] walks one frame through link, network, transport and
//! application decoders and returns the typed record chain. Every record
//! renders as a labeled text block; [`render::FrameWriter`] strings those
//! blocks together for a capture session.

pub mod engine;
pub mod error;
pub mod layer;
pub mod packet;
pub mod render;

pub use engine::{DecodeError, DecodeFailure, Dissection, Dissector, Termination};
pub use error::{Error, Result};
pub use layer::{Layer, LayerError, ProtocolProcessor};
pub use packet::Frame;
pub use render::{CaptureSummary, FrameWriter};
