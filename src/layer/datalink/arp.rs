use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use super::MacAddr;
use crate::engine::constants::ethertype;
use crate::engine::cursor::{require, Cursor};
use crate::layer::{LayerError, ProtocolProcessor};

/// Hardware type, protocol type, both lengths and the operation code.
pub const FIXED_LEN: usize = 8;

/// ARP operation codes (RFC 826, RFC 903).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpOperation {
    Request,
    Reply,
    ReverseRequest,
    ReverseReply,
    /// For unrecognized operation codes.
    Unknown(u16),
}

impl ArpOperation {
    pub fn from_u16(code: u16) -> Self {
        match code {
            1 => Self::Request,
            2 => Self::Reply,
            3 => Self::ReverseRequest,
            4 => Self::ReverseReply,
            other => Self::Unknown(other),
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            Self::Request => 1,
            Self::Reply => 2,
            Self::ReverseRequest => 3,
            Self::ReverseReply => 4,
            Self::Unknown(code) => code,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Request => "Request",
            Self::Reply => "Reply",
            Self::ReverseRequest => "Reverse Request",
            Self::ReverseReply => "Reverse Reply",
            Self::Unknown(_) => "Unknown",
        }
    }
}

/// An ARP packet as defined in RFC 826.
///
/// The address fields are views sized by the hardware and protocol length
/// octets, so non-Ethernet/IPv4 variants still decode. The typed accessors
/// return `None` when the lengths do not match the requested address family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpPacket<'a> {
    /// Link-layer protocol type (e.g., 1 for Ethernet).
    pub hardware_type: u16,
    /// Network-layer protocol type (e.g., 0x0800 for IPv4).
    pub protocol_type: u16,
    pub hardware_len: u8,
    pub protocol_len: u8,
    pub operation: ArpOperation,
    pub sender_hardware_addr: &'a [u8],
    pub sender_protocol_addr: &'a [u8],
    pub target_hardware_addr: &'a [u8],
    pub target_protocol_addr: &'a [u8],
}

impl ArpPacket<'_> {
    /// Size of the whole ARP body as declared by the length octets.
    pub fn declared_len(&self) -> usize {
        declared_len(self.hardware_len, self.protocol_len)
    }

    pub fn sender_mac(&self) -> Option<MacAddr> {
        as_mac(self.sender_hardware_addr)
    }

    pub fn target_mac(&self) -> Option<MacAddr> {
        as_mac(self.target_hardware_addr)
    }

    pub fn sender_ipv4(&self) -> Option<Ipv4Addr> {
        as_ipv4(self.sender_protocol_addr)
    }

    pub fn target_ipv4(&self) -> Option<Ipv4Addr> {
        as_ipv4(self.target_protocol_addr)
    }
}

fn declared_len(hardware_len: u8, protocol_len: u8) -> usize {
    FIXED_LEN + 2 * (hardware_len as usize + protocol_len as usize)
}

fn as_mac(bytes: &[u8]) -> Option<MacAddr> {
    <[u8; 6]>::try_from(bytes).ok().map(MacAddr)
}

fn as_ipv4(bytes: &[u8]) -> Option<Ipv4Addr> {
    <[u8; 4]>::try_from(bytes).ok().map(Ipv4Addr::from)
}

/// A processor for ARP packets.
pub struct ArpProcessor;

impl<'a> ProtocolProcessor<'a> for ArpProcessor {
    type Record = ArpPacket<'a>;

    fn parse(&self, data: &'a [u8]) -> Result<ArpPacket<'a>, LayerError> {
        require("arp", data, FIXED_LEN)?;

        let hardware_len = data[4];
        let protocol_len = data[5];
        // For Ethernet/IPv4 this totals 2+2+1+1+2+6+4+6+4 = 28 bytes.
        require("arp", data, declared_len(hardware_len, protocol_len))?;

        let mut cursor = Cursor::new(data);
        let truncated = || LayerError::TruncatedHeader {
            protocol: "arp",
            needed: declared_len(hardware_len, protocol_len),
            available: data.len(),
        };
        let hardware_type = cursor.read_u16_be().ok_or_else(truncated)?;
        let protocol_type = cursor.read_u16_be().ok_or_else(truncated)?;
        cursor.advance(2);
        let operation = ArpOperation::from_u16(cursor.read_u16_be().ok_or_else(truncated)?);

        let hlen = hardware_len as usize;
        let plen = protocol_len as usize;
        let sender_hardware_addr = cursor.read_exact(hlen).ok_or_else(truncated)?;
        let sender_protocol_addr = cursor.read_exact(plen).ok_or_else(truncated)?;
        let target_hardware_addr = cursor.read_exact(hlen).ok_or_else(truncated)?;
        let target_protocol_addr = cursor.read_exact(plen).ok_or_else(truncated)?;

        Ok(ArpPacket {
            hardware_type,
            protocol_type,
            hardware_len,
            protocol_len,
            operation,
            sender_hardware_addr,
            sender_protocol_addr,
            target_hardware_addr,
            target_protocol_addr,
        })
    }
}

fn fmt_hardware(bytes: &[u8]) -> String {
    match as_mac(bytes) {
        Some(mac) => mac.to_string(),
        None => hex::encode(bytes),
    }
}

fn fmt_protocol(protocol_type: u16, bytes: &[u8]) -> String {
    if protocol_type == ethertype::IPV4 {
        if let Some(addr) = as_ipv4(bytes) {
            return addr.to_string();
        }
    }
    if protocol_type == ethertype::IPV6 {
        if let Ok(octets) = <[u8; 16]>::try_from(bytes) {
            return Ipv6Addr::from(octets).to_string();
        }
    }
    hex::encode(bytes)
}

impl fmt::Display for ArpPacket<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ARP Packet:")?;
        writeln!(f, "- Hardware Type: {}", self.hardware_type)?;
        writeln!(f, "- Protocol Type: {:#06x}", self.protocol_type)?;
        writeln!(f, "- Hardware Size: {}", self.hardware_len)?;
        writeln!(f, "- Protocol Size: {}", self.protocol_len)?;
        writeln!(
            f,
            "- Op: {} ({})",
            self.operation.as_str(),
            self.operation.to_u16()
        )?;
        writeln!(f, "- Sender MAC: {}", fmt_hardware(self.sender_hardware_addr))?;
        writeln!(
            f,
            "- Sender IP: {}",
            fmt_protocol(self.protocol_type, self.sender_protocol_addr)
        )?;
        writeln!(f, "- Target MAC: {}", fmt_hardware(self.target_hardware_addr))?;
        writeln!(
            f,
            "- Target IP: {}",
            fmt_protocol(self.protocol_type, self.target_protocol_addr)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// ARP request for Ethernet/IPv4: who has 192.168.0.2, tell 192.168.0.1.
    fn create_sample_arp_request() -> Vec<u8> {
        let mut packet = Vec::with_capacity(28);
        packet.extend_from_slice(&1u16.to_be_bytes());
        packet.extend_from_slice(&0x0800u16.to_be_bytes());
        packet.push(6);
        packet.push(4);
        packet.extend_from_slice(&1u16.to_be_bytes());
        packet.extend_from_slice(&[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        packet.extend_from_slice(&[192, 168, 0, 1]);
        packet.extend_from_slice(&[0; 6]);
        packet.extend_from_slice(&[192, 168, 0, 2]);
        packet
    }

    #[test]
    fn test_parse_arp_request() {
        let bytes = create_sample_arp_request();
        let arp = ArpProcessor.parse(&bytes).expect("ARP request should parse");

        assert_eq!(arp.hardware_type, 1);
        assert_eq!(arp.protocol_type, 0x0800);
        assert_eq!(arp.operation, ArpOperation::Request);
        assert_eq!(
            arp.sender_mac(),
            Some(MacAddr([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]))
        );
        assert_eq!(arp.sender_ipv4(), Some(Ipv4Addr::new(192, 168, 0, 1)));
        assert_eq!(arp.target_ipv4(), Some(Ipv4Addr::new(192, 168, 0, 2)));
        assert_eq!(arp.declared_len(), 28);
    }

    #[test]
    fn test_unknown_operation_is_kept() {
        let mut bytes = create_sample_arp_request();
        bytes[7] = 9;
        let arp = ArpProcessor.parse(&bytes).expect("opcode does not affect layout");
        assert_eq!(arp.operation, ArpOperation::Unknown(9));
        assert_eq!(arp.operation.as_str(), "Unknown");
    }

    #[test]
    fn test_short_fixed_part() {
        let result = ArpProcessor.parse(&[0, 1, 8, 0, 6]);
        assert!(matches!(
            result,
            Err(LayerError::TruncatedHeader { needed: 8, .. })
        ));
    }

    #[test]
    fn test_short_address_part() {
        let bytes = create_sample_arp_request();
        let result = ArpProcessor.parse(&bytes[..27]);
        assert!(matches!(
            result,
            Err(LayerError::TruncatedHeader {
                protocol: "arp",
                needed: 28,
                available: 27
            })
        ));
    }

    #[test]
    fn test_non_ethernet_lengths_decode_as_views() {
        let mut bytes = vec![0x00, 0x06, 0x08, 0x00, 2, 4, 0x00, 0x02];
        bytes.extend_from_slice(&[0xaa, 0xbb, 10, 0, 0, 1, 0xcc, 0xdd, 10, 0, 0, 2]);
        let arp = ArpProcessor.parse(&bytes).expect("generic lengths parse");
        assert_eq!(arp.sender_hardware_addr, &[0xaa, 0xbb]);
        assert_eq!(arp.sender_mac(), None);
        assert_eq!(arp.target_ipv4(), Some(Ipv4Addr::new(10, 0, 0, 2)));
    }

    #[test]
    fn test_render() {
        let bytes = create_sample_arp_request();
        let text = ArpProcessor.parse(&bytes).expect("parse").to_string();
        assert!(text.starts_with("ARP Packet:\n"));
        assert!(text.contains("- Op: Request (1)\n"));
        assert!(text.contains("- Sender IP: 192.168.0.1\n"));
        assert!(text.contains("- Target MAC: 00:00:00:00:00:00\n"));
    }
}
