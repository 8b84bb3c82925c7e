use std::fmt;
use std::time::SystemTime;

use tracing::{debug, trace};

use super::error::{DecodeError, DecodeFailure};
use super::registry::{self, TransportProtocol};
use crate::layer::application::ApplicationRecord;
use crate::layer::datalink::{EthernetFrame, EthernetProcessor};
use crate::layer::network::NetworkRecord;
use crate::layer::transport::TransportRecord;
use crate::layer::{Layer, ProtocolProcessor};
use crate::packet::Frame;

#[cfg(test)]
mod tests;

/// How the layer walk for one frame ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The last decoded layer has no successor, or handed over no bytes.
    Complete,
    /// The dispatch value for `layer` has no registered decoder.
    UnsupportedProtocol { layer: Layer, value: u32 },
    /// The decoder at `layer` rejected its input.
    Failed { layer: Layer },
}

/// The record chain decoded from one frame, outermost layer first.
///
/// A layer is only present if every layer before it decoded. Payload views
/// in the records borrow from the frame bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dissection<'a> {
    pub timestamp: SystemTime,
    pub link: Option<EthernetFrame<'a>>,
    pub network: Option<NetworkRecord<'a>>,
    pub transport: Option<TransportRecord<'a>>,
    pub application: Option<ApplicationRecord<'a>>,
    pub termination: Termination,
}

impl<'a> Dissection<'a> {
    fn new(timestamp: SystemTime) -> Self {
        Self {
            timestamp,
            link: None,
            network: None,
            transport: None,
            application: None,
            termination: Termination::Complete,
        }
    }

    /// Decoded records in chain order, for rendering.
    pub fn records<'s>(&'s self) -> impl Iterator<Item = &'s dyn fmt::Display> {
        let link = self.link.as_ref().map(|r| r as &dyn fmt::Display);
        let network = self.network.as_ref().map(|r| r as &dyn fmt::Display);
        let transport = self.transport.as_ref().map(|r| r as &dyn fmt::Display);
        let application = self.application.as_ref().map(|r| r as &dyn fmt::Display);
        [link, network, transport, application].into_iter().flatten()
    }

    /// Number of layers decoded.
    pub fn depth(&self) -> usize {
        self.records().count()
    }

    pub fn is_complete(&self) -> bool {
        self.termination == Termination::Complete
    }
}

/// Drives one Ethernet frame through link, network, transport and
/// application decoding.
///
/// The dissector holds no state: every call builds a fresh [`Dissection`],
/// so one value can be shared across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dissector;

impl Dissector {
    pub fn new() -> Self {
        Self
    }

    pub fn decode_frame<'a>(&self, frame: &Frame<'a>) -> Result<Dissection<'a>, DecodeFailure<'a>> {
        self.decode(frame.data(), frame.timestamp())
    }

    /// Decodes `data` as far as the registry knows how.
    ///
    /// An unknown dispatch value stops the walk with `Ok` and a
    /// [`Termination::UnsupportedProtocol`]. A decoder failure returns the
    /// layers decoded before it inside the [`DecodeFailure`].
    pub fn decode<'a>(
        &self,
        data: &'a [u8],
        timestamp: SystemTime,
    ) -> Result<Dissection<'a>, DecodeFailure<'a>> {
        let mut dissection = Dissection::new(timestamp);
        match walk(data, &mut dissection) {
            Ok(termination) => {
                dissection.termination = termination;
                Ok(dissection)
            }
            Err(error) => {
                debug!(
                    layer = %error.layer,
                    error = %error.source,
                    frame_len = data.len(),
                    "decode failed"
                );
                dissection.termination = Termination::Failed { layer: error.layer };
                Err(DecodeFailure {
                    error,
                    partial: dissection,
                })
            }
        }
    }
}

fn unsupported(layer: Layer, value: u32) -> Termination {
    debug!(layer = %layer, value = value, "no decoder registered");
    Termination::UnsupportedProtocol { layer, value }
}

fn walk<'a>(data: &'a [u8], out: &mut Dissection<'a>) -> Result<Termination, DecodeError> {
    let link = EthernetProcessor
        .parse(data)
        .map_err(DecodeError::at(Layer::Link))?;
    let ethertype = link.ethertype;
    let payload = link.payload;
    out.link = Some(link);

    let Some(network) = registry::network_for(ethertype) else {
        return Ok(unsupported(Layer::Network, u32::from(ethertype)));
    };
    trace!(ethertype = ethertype, decoder = network.name(), "network dispatch");
    let record = network
        .decode(payload)
        .map_err(DecodeError::at(Layer::Network))?;
    let next = record.next_protocol();
    let payload = record.payload();
    out.network = Some(record);

    let Some(next) = next else {
        return Ok(Termination::Complete);
    };
    let Some(transport) = registry::transport_for(network, next) else {
        return Ok(unsupported(Layer::Transport, u32::from(next)));
    };
    trace!(protocol = next, decoder = transport.name(), "transport dispatch");
    let record = transport
        .decode(payload)
        .map_err(DecodeError::at(Layer::Transport))?;
    let ports = record.ports();
    let payload = record.payload();
    out.transport = Some(record);

    match ports {
        Some((source, destination)) if !payload.is_empty() => {
            application(transport, source, destination, payload, out)
        }
        _ => Ok(Termination::Complete),
    }
}

fn application<'a>(
    transport: TransportProtocol,
    source: u16,
    destination: u16,
    payload: &'a [u8],
    out: &mut Dissection<'a>,
) -> Result<Termination, DecodeError> {
    let Some(protocol) = registry::application_for(transport, source, destination) else {
        return Ok(unsupported(Layer::Application, u32::from(destination)));
    };
    trace!(
        source_port = source,
        destination_port = destination,
        decoder = protocol.name(),
        "application dispatch"
    );
    let record = protocol
        .decode(transport, payload)
        .map_err(DecodeError::at(Layer::Application))?;
    out.application = Some(record);
    Ok(Termination::Complete)
}
