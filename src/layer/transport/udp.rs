use std::fmt;

use crate::engine::cursor::{require, Cursor};
use crate::layer::{LayerError, ProtocolProcessor};

pub const HEADER_LEN: usize = 8;

/// Represents a UDP datagram.
///
/// The UDP header format is defined in RFC 768 and consists of:
///
///   0      7 8     15 16    23 24    31
///  +--------+--------+--------+--------+
///  |     Source      |   Destination   |
///  |      Port       |      Port       |
///  +--------+--------+--------+--------+
///  |                 |                 |
///  |     Length      |    Checksum     |
///  +--------+--------+--------+--------+
///  |                                   |
///  |            Data (variable)        |
///  +-----------------------------------+
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpDatagram<'a> {
    pub source_port: u16,
    pub destination_port: u16,
    /// Length of UDP header and data in bytes
    pub length: u16,
    pub checksum: u16,
    pub payload: &'a [u8],
}

/// Processor for UDP datagrams.
pub struct UdpProcessor;

impl<'a> ProtocolProcessor<'a> for UdpProcessor {
    type Record = UdpDatagram<'a>;

    fn parse(&self, data: &'a [u8]) -> Result<UdpDatagram<'a>, LayerError> {
        require("udp", data, HEADER_LEN)?;

        let truncated = || LayerError::TruncatedHeader {
            protocol: "udp",
            needed: HEADER_LEN,
            available: data.len(),
        };
        let mut cursor = Cursor::new(data);
        let source_port = cursor.read_u16_be().ok_or_else(truncated)?;
        let destination_port = cursor.read_u16_be().ok_or_else(truncated)?;
        let length = cursor.read_u16_be().ok_or_else(truncated)?;
        let checksum = cursor.read_u16_be().ok_or_else(truncated)?;

        // Zero is a jumbogram (RFC 2675): the length comes from the IPv6 layer.
        let end = match length as usize {
            0 => data.len(),
            declared if declared < HEADER_LEN => {
                return Err(LayerError::InvalidDeclaredLength {
                    protocol: "udp",
                    declared,
                    available: data.len(),
                });
            }
            declared => declared.min(data.len()),
        };

        Ok(UdpDatagram {
            source_port,
            destination_port,
            length,
            checksum,
            payload: &data[HEADER_LEN..end],
        })
    }
}

impl fmt::Display for UdpDatagram<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "UDP Segment:")?;
        writeln!(f, "- SrcPort: {}", self.source_port)?;
        writeln!(f, "- DstPort: {}", self.destination_port)?;
        writeln!(f, "- UDP Length: {}", self.length)?;
        writeln!(f, "- Checksum: {:#06x}", self.checksum)?;
        writeln!(
            f,
            "- Payload: ({} bytes) {}",
            self.payload.len(),
            hex::encode(self.payload)
        )
    }
}
