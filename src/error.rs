//! Crate-level error type for callers that render frames.
//!
//! Decoding itself reports [`DecodeError`] (through
//! [`DecodeFailure`](crate::engine::DecodeFailure)); this type adds the I/O
//! failures of the output sink.

use thiserror::Error;

use crate::engine::DecodeError;

#[derive(Error, Debug)]
pub enum Error {
    /// A frame failed to decode; the partial chain was already written.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
