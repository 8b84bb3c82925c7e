//! The network layer (Layer 3) modules.

pub mod dscp;
pub mod ipv4;
pub mod ipv6;

use std::fmt;

use super::datalink::ArpPacket;

pub use dscp::TrafficClass;
pub use ipv4::{Ipv4Packet, Ipv4Processor};
pub use ipv6::{Ipv6Packet, Ipv6Processor};

/// Whatever the ethertype selected. ARP is carried here because it occupies
/// the slot after Ethernet, even though it has no successor layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkRecord<'a> {
    Ipv4(Ipv4Packet<'a>),
    Ipv6(Ipv6Packet<'a>),
    Arp(ArpPacket<'a>),
}

impl<'a> NetworkRecord<'a> {
    /// Protocol number of the next header, if this record has a successor.
    pub fn next_protocol(&self) -> Option<u8> {
        match self {
            Self::Ipv4(ip) => Some(ip.protocol),
            Self::Ipv6(ip) => Some(ip.next_header),
            Self::Arp(_) => None,
        }
    }

    pub fn payload(&self) -> &'a [u8] {
        match self {
            Self::Ipv4(ip) => ip.payload,
            Self::Ipv6(ip) => ip.payload,
            Self::Arp(_) => &[],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ipv4(_) => "IPv4",
            Self::Ipv6(_) => "IPv6",
            Self::Arp(_) => "ARP",
        }
    }
}

impl fmt::Display for NetworkRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ipv4(ip) => ip.fmt(f),
            Self::Ipv6(ip) => ip.fmt(f),
            Self::Arp(arp) => arp.fmt(f),
        }
    }
}
