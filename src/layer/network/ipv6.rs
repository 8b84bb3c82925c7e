use std::fmt;
use std::net::Ipv6Addr;

use super::dscp::TrafficClass;
use crate::engine::constants::ip_protocol_name;
use crate::engine::cursor::{bits, require, Cursor};
use crate::layer::{LayerError, ProtocolProcessor};

pub const HEADER_LEN: usize = 40;

/// Represents an IPv6 packet header.
///
/// The IPv6 fixed header format is defined in RFC 8200. The header is always 40 bytes:
///
///   +---------------------------------------------------------------+
///   |Version| Traffic Class (8)       |         Flow Label (20)       |
///   +---------------------------------------------------------------+
///   |         Payload Length (16)       | Next Header (8)| Hop Limit (8)|
///   +---------------------------------------------------------------+
///   |                                                               |
///   |                         Source Address (128)                  |
///   |                                                               |
///   +---------------------------------------------------------------+
///   |                                                               |
///   |                      Destination Address (128)                |
///   |                                                               |
///   +---------------------------------------------------------------+
///
/// Extension headers are not walked; `next_header` is reported as found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv6Packet<'a> {
    pub version: u8,
    pub traffic_class: TrafficClass,
    /// Flow Label (20 bits).
    pub flow_label: u32,
    pub payload_length: u16,
    pub next_header: u8,
    pub hop_limit: u8,
    pub source: Ipv6Addr,
    pub destination: Ipv6Addr,
    pub payload: &'a [u8],
}

impl Ipv6Packet<'_> {
    pub fn next_header_name(&self) -> &'static str {
        ip_protocol_name(self.next_header)
    }
}

pub struct Ipv6Processor;

impl<'a> ProtocolProcessor<'a> for Ipv6Processor {
    type Record = Ipv6Packet<'a>;

    fn parse(&self, data: &'a [u8]) -> Result<Ipv6Packet<'a>, LayerError> {
        require("ipv6", data, HEADER_LEN)?;

        let truncated = || LayerError::TruncatedHeader {
            protocol: "ipv6",
            needed: HEADER_LEN,
            available: data.len(),
        };
        let mut cursor = Cursor::new(data);
        let first_word = cursor.read_u32_be().ok_or_else(truncated)?;
        let payload_length = cursor.read_u16_be().ok_or_else(truncated)?;
        let next_header = cursor.read_u8().ok_or_else(truncated)?;
        let hop_limit = cursor.read_u8().ok_or_else(truncated)?;
        let source = Ipv6Addr::from(cursor.read_array::<16>().ok_or_else(truncated)?);
        let destination = Ipv6Addr::from(cursor.read_array::<16>().ok_or_else(truncated)?);

        // Jumbograms and snapped captures both leave the declared length
        // disagreeing with the buffer; trust whichever is shorter.
        let end = (HEADER_LEN + payload_length as usize).min(data.len());

        Ok(Ipv6Packet {
            version: bits(first_word, 28, 4) as u8,
            traffic_class: TrafficClass(bits(first_word, 20, 8) as u8),
            flow_label: bits(first_word, 0, 20),
            payload_length,
            next_header,
            hop_limit,
            source,
            destination,
            payload: &data[HEADER_LEN..end],
        })
    }
}

impl fmt::Display for Ipv6Packet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "IPv6 Packet:")?;
        writeln!(f, "- Version: {}", self.version)?;
        writeln!(f, "- Traffic Class: {}", self.traffic_class)?;
        writeln!(f, "- Flow Label: {:#07x}", self.flow_label)?;
        writeln!(f, "- Payload Length: {}", self.payload_length)?;
        writeln!(
            f,
            "- Next Header: {} ({})",
            self.next_header_name(),
            self.next_header
        )?;
        writeln!(f, "- Hop Limit: {}", self.hop_limit)?;
        writeln!(f, "- SrcIP: {}", self.source)?;
        writeln!(f, "- DstIP: {}", self.destination)?;
        writeln!(
            f,
            "- Payload: ({} bytes) {}",
            self.payload.len(),
            hex::encode(self.payload)
        )
    }
}
