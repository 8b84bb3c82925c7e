use thiserror::Error;

use super::dissector::Dissection;
use crate::layer::{Layer, LayerError};

/// A decoder failure tagged with the layer it happened at.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{layer} layer: {source}")]
pub struct DecodeError {
    pub layer: Layer,
    pub source: LayerError,
}

impl DecodeError {
    pub fn new(layer: Layer, source: LayerError) -> Self {
        Self { layer, source }
    }

    /// Adapter for `map_err` at a given layer.
    pub(crate) fn at(layer: Layer) -> impl Fn(LayerError) -> Self {
        move |source| Self::new(layer, source)
    }
}

/// A failed decode together with every layer decoded before the failure.
#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct DecodeFailure<'a> {
    pub error: DecodeError,
    pub partial: Dissection<'a>,
}

impl<'a> DecodeFailure<'a> {
    pub fn into_parts(self) -> (DecodeError, Dissection<'a>) {
        (self.error, self.partial)
    }
}
