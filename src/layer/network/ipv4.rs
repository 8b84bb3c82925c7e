use std::fmt;
use std::net::Ipv4Addr;

use super::dscp::TrafficClass;
use crate::engine::constants::ip_protocol_name;
use crate::engine::cursor::{bits, require, Cursor};
use crate::layer::{LayerError, ProtocolProcessor};

pub const MIN_HEADER_LEN: usize = 20;

/// IPv4 Header
///
/// The IPv4 header format is defined in RFC 791:
///
///   +---------------------------------------------------------------+
///   | Version (4) | IHL (4) | DSCP (6) | ECN (2) | Total Length (16)|
///   +---------------------------------------------------------------+
///   |   Identification (16)   |Flags (3)|   Fragment Offset (13)    |
///   +---------------------------------------------------------------+
///   |   TTL (8)   |   Protocol (8)    |    Header Checksum (16)     |
///   +---------------------------------------------------------------+
///   |                   Source IP Address (32)                      |
///   +---------------------------------------------------------------+
///   |                Destination IP Address (32)                    |
///   +---------------------------------------------------------------+
///   |             Options (if IHL > 5; Variable length)             |
///   +---------------------------------------------------------------+
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Packet<'a> {
    /// IP version (4 for well-formed packets; not enforced).
    pub version: u8,
    /// Internet Header Length in 32-bit words.
    pub ihl: u8,
    /// Type-of-service byte (DSCP + ECN).
    pub tos: TrafficClass,
    pub total_length: u16,
    pub identification: u16,
    /// Flags (3 bits): reserved, don't fragment, more fragments.
    pub flags: u8,
    pub fragment_offset: u16,
    pub ttl: u8,
    /// Protocol of the next header.
    pub protocol: u8,
    pub checksum: u16,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    /// Option bytes between the fixed header and the declared header end.
    pub options: &'a [u8],
    /// Bytes after the header, clipped to the declared total length.
    pub payload: &'a [u8],
}

impl Ipv4Packet<'_> {
    pub fn header_len(&self) -> usize {
        self.ihl as usize * 4
    }

    pub fn dont_fragment(&self) -> bool {
        self.flags & 0b010 != 0
    }

    pub fn more_fragments(&self) -> bool {
        self.flags & 0b001 != 0
    }

    pub fn protocol_name(&self) -> &'static str {
        ip_protocol_name(self.protocol)
    }
}

/// Processor handling IPv4 packet parsing.
pub struct Ipv4Processor;

impl<'a> ProtocolProcessor<'a> for Ipv4Processor {
    type Record = Ipv4Packet<'a>;

    fn parse(&self, data: &'a [u8]) -> Result<Ipv4Packet<'a>, LayerError> {
        require("ipv4", data, MIN_HEADER_LEN)?;

        let version = data[0] >> 4;
        let ihl = data[0] & 0x0F;
        let header_len = ihl as usize * 4;
        if header_len < MIN_HEADER_LEN || header_len > data.len() {
            return Err(LayerError::InvalidDeclaredLength {
                protocol: "ipv4",
                declared: header_len,
                available: data.len(),
            });
        }

        let mut cursor = Cursor::new(data);
        cursor.advance(1);
        let truncated = || LayerError::TruncatedHeader {
            protocol: "ipv4",
            needed: MIN_HEADER_LEN,
            available: data.len(),
        };
        let tos = TrafficClass(cursor.read_u8().ok_or_else(truncated)?);
        let total_length = cursor.read_u16_be().ok_or_else(truncated)?;
        let identification = cursor.read_u16_be().ok_or_else(truncated)?;
        let flags_fragment = cursor.read_u16_be().ok_or_else(truncated)? as u32;
        let ttl = cursor.read_u8().ok_or_else(truncated)?;
        let protocol = cursor.read_u8().ok_or_else(truncated)?;
        let checksum = cursor.read_u16_be().ok_or_else(truncated)?;
        let source = Ipv4Addr::from(cursor.read_array::<4>().ok_or_else(truncated)?);
        let destination = Ipv4Addr::from(cursor.read_array::<4>().ok_or_else(truncated)?);

        if (total_length as usize) < header_len {
            return Err(LayerError::InvalidDeclaredLength {
                protocol: "ipv4",
                declared: total_length as usize,
                available: data.len(),
            });
        }
        // Captures may be cut short by the snapshot length, and Ethernet
        // padding may follow the datagram: the payload ends at whichever
        // comes first.
        let end = (total_length as usize).min(data.len());

        Ok(Ipv4Packet {
            version,
            ihl,
            tos,
            total_length,
            identification,
            flags: bits(flags_fragment, 13, 3) as u8,
            fragment_offset: bits(flags_fragment, 0, 13) as u16,
            ttl,
            protocol,
            checksum,
            source,
            destination,
            options: &data[MIN_HEADER_LEN..header_len],
            payload: &data[header_len..end],
        })
    }
}

impl fmt::Display for Ipv4Packet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "IPv4 Packet:")?;
        writeln!(f, "- Version: {}", self.version)?;
        writeln!(f, "- IHL: {} ({} bytes)", self.ihl, self.header_len())?;
        writeln!(f, "- Type of Service: {}", self.tos)?;
        writeln!(f, "- Total Length: {}", self.total_length)?;
        writeln!(f, "- Identification: {:#06x}", self.identification)?;
        writeln!(
            f,
            "- Flags: {:#05b} (Don't Fragment: {}, More Fragments: {})",
            self.flags,
            u8::from(self.dont_fragment()),
            u8::from(self.more_fragments())
        )?;
        writeln!(f, "- Fragment Offset: {}", self.fragment_offset)?;
        writeln!(f, "- TTL: {}", self.ttl)?;
        writeln!(f, "- Protocol: {} ({})", self.protocol_name(), self.protocol)?;
        writeln!(f, "- Header Checksum: {:#06x}", self.checksum)?;
        writeln!(f, "- SrcIP: {}", self.source)?;
        writeln!(f, "- DstIP: {}", self.destination)?;
        if !self.options.is_empty() {
            writeln!(
                f,
                "- Options: ({} bytes) {}",
                self.options.len(),
                hex::encode(self.options)
            )?;
        }
        writeln!(
            f,
            "- Payload: ({} bytes) {}",
            self.payload.len(),
            hex::encode(self.payload)
        )
    }
}
