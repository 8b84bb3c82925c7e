//! The transport layer (Layer 4) modules.
//! TCP and UDP carry ports for application dispatch; ICMP and ICMPv6 end
//! the chain with a type-dependent body.

pub mod icmp;
pub mod icmpv6;
pub mod tcp;
pub mod udp;

use std::fmt;

pub use icmp::{IcmpPayload, IcmpProcessor, IcmpSegment};
pub use icmpv6::{Icmpv6Payload, Icmpv6Processor, Icmpv6Segment};
pub use tcp::{TcpFlags, TcpProcessor, TcpSegment};
pub use udp::{UdpDatagram, UdpProcessor};

/// Represents the parsed transport layer information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportRecord<'a> {
    Tcp(TcpSegment<'a>),
    Udp(UdpDatagram<'a>),
    Icmp(IcmpSegment<'a>),
    Icmpv6(Icmpv6Segment<'a>),
}

impl<'a> TransportRecord<'a> {
    /// (source, destination) ports for the port-addressed protocols.
    pub fn ports(&self) -> Option<(u16, u16)> {
        match self {
            Self::Tcp(tcp) => Some((tcp.source_port, tcp.destination_port)),
            Self::Udp(udp) => Some((udp.source_port, udp.destination_port)),
            Self::Icmp(_) | Self::Icmpv6(_) => None,
        }
    }

    /// Bytes handed to the application layer; empty for ICMP variants.
    pub fn payload(&self) -> &'a [u8] {
        match self {
            Self::Tcp(tcp) => tcp.payload,
            Self::Udp(udp) => udp.payload,
            Self::Icmp(_) | Self::Icmpv6(_) => &[],
        }
    }

    pub fn protocol_name(&self) -> &'static str {
        match self {
            Self::Tcp(_) => "TCP",
            Self::Udp(_) => "UDP",
            Self::Icmp(_) => "ICMP",
            Self::Icmpv6(_) => "ICMPv6",
        }
    }
}

impl fmt::Display for TransportRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp(tcp) => tcp.fmt(f),
            Self::Udp(udp) => udp.fmt(f),
            Self::Icmp(icmp) => icmp.fmt(f),
            Self::Icmpv6(icmp) => icmp.fmt(f),
        }
    }
}
