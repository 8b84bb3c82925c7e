//! Static dispatch tables from a layer's next-protocol value to the decoder
//! of the following layer. Anything not listed ends the chain.

use super::constants::{ethertype, ip_proto, port};
use crate::layer::application::{
    ApplicationRecord, DnsProcessor, DnsTcpProcessor, HttpProcessor, SnmpProcessor,
};
use crate::layer::datalink::ArpProcessor;
use crate::layer::network::{Ipv4Processor, Ipv6Processor, NetworkRecord};
use crate::layer::transport::{
    IcmpProcessor, Icmpv6Processor, TcpProcessor, TransportRecord, UdpProcessor,
};
use crate::layer::{LayerError, ProtocolProcessor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkProtocol {
    Ipv4,
    Ipv6,
    Arp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportProtocol {
    Tcp,
    Udp,
    Icmp,
    Icmpv6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplicationProtocol {
    Dns,
    Http,
    Snmp,
}

static ETHERTYPES: &[(u16, NetworkProtocol)] = &[
    (ethertype::IPV4, NetworkProtocol::Ipv4),
    (ethertype::IPV6, NetworkProtocol::Ipv6),
    (ethertype::ARP, NetworkProtocol::Arp),
];

static IPV4_PROTOCOLS: &[(u8, TransportProtocol)] = &[
    (ip_proto::ICMP, TransportProtocol::Icmp),
    (ip_proto::TCP, TransportProtocol::Tcp),
    (ip_proto::UDP, TransportProtocol::Udp),
];

static IPV6_NEXT_HEADERS: &[(u8, TransportProtocol)] = &[
    (ip_proto::TCP, TransportProtocol::Tcp),
    (ip_proto::UDP, TransportProtocol::Udp),
    (ip_proto::ICMPV6, TransportProtocol::Icmpv6),
];

static APPLICATION_PORTS: &[(TransportProtocol, u16, ApplicationProtocol)] = &[
    (TransportProtocol::Udp, port::DNS, ApplicationProtocol::Dns),
    (TransportProtocol::Tcp, port::DNS, ApplicationProtocol::Dns),
    (TransportProtocol::Tcp, port::HTTP, ApplicationProtocol::Http),
    (TransportProtocol::Udp, port::SNMP, ApplicationProtocol::Snmp),
    (TransportProtocol::Udp, port::SNMP_TRAP, ApplicationProtocol::Snmp),
    (TransportProtocol::Tcp, port::SNMP, ApplicationProtocol::Snmp),
    (TransportProtocol::Tcp, port::SNMP_TRAP, ApplicationProtocol::Snmp),
];

pub fn network_for(ethertype: u16) -> Option<NetworkProtocol> {
    ETHERTYPES
        .iter()
        .find(|(value, _)| *value == ethertype)
        .map(|(_, protocol)| *protocol)
}

/// ARP has no successor, so it never selects a transport decoder.
pub fn transport_for(network: NetworkProtocol, protocol: u8) -> Option<TransportProtocol> {
    let table = match network {
        NetworkProtocol::Ipv4 => IPV4_PROTOCOLS,
        NetworkProtocol::Ipv6 => IPV6_NEXT_HEADERS,
        NetworkProtocol::Arp => return None,
    };
    table
        .iter()
        .find(|(value, _)| *value == protocol)
        .map(|(_, transport)| *transport)
}

/// The destination port is tried first so a request from an ephemeral port
/// that happens to be well-known is still classified by its server side.
pub fn application_for(
    transport: TransportProtocol,
    source: u16,
    destination: u16,
) -> Option<ApplicationProtocol> {
    let by_port = |wanted: u16| {
        APPLICATION_PORTS
            .iter()
            .find(|(proto, value, _)| *proto == transport && *value == wanted)
            .map(|(_, _, app)| *app)
    };
    by_port(destination).or_else(|| by_port(source))
}

impl NetworkProtocol {
    pub fn name(self) -> &'static str {
        match self {
            Self::Ipv4 => "IPv4",
            Self::Ipv6 => "IPv6",
            Self::Arp => "ARP",
        }
    }

    pub fn decode<'a>(self, data: &'a [u8]) -> Result<NetworkRecord<'a>, LayerError> {
        Ok(match self {
            Self::Ipv4 => NetworkRecord::Ipv4(Ipv4Processor.parse(data)?),
            Self::Ipv6 => NetworkRecord::Ipv6(Ipv6Processor.parse(data)?),
            Self::Arp => NetworkRecord::Arp(ArpProcessor.parse(data)?),
        })
    }
}

impl TransportProtocol {
    pub fn name(self) -> &'static str {
        match self {
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
            Self::Icmp => "ICMP",
            Self::Icmpv6 => "ICMPv6",
        }
    }

    pub fn decode<'a>(self, data: &'a [u8]) -> Result<TransportRecord<'a>, LayerError> {
        Ok(match self {
            Self::Tcp => TransportRecord::Tcp(TcpProcessor.parse(data)?),
            Self::Udp => TransportRecord::Udp(UdpProcessor.parse(data)?),
            Self::Icmp => TransportRecord::Icmp(IcmpProcessor.parse(data)?),
            Self::Icmpv6 => TransportRecord::Icmpv6(Icmpv6Processor.parse(data)?),
        })
    }
}

impl ApplicationProtocol {
    pub fn name(self) -> &'static str {
        match self {
            Self::Dns => "DNS",
            Self::Http => "HTTP",
            Self::Snmp => "SNMP",
        }
    }

    /// DNS framing depends on the carrier, so the transport is passed along.
    pub fn decode<'a>(
        self,
        transport: TransportProtocol,
        data: &'a [u8],
    ) -> Result<ApplicationRecord<'a>, LayerError> {
        Ok(match (self, transport) {
            (Self::Dns, TransportProtocol::Tcp) => {
                ApplicationRecord::Dns(DnsTcpProcessor.parse(data)?)
            }
            (Self::Dns, _) => ApplicationRecord::Dns(DnsProcessor.parse(data)?),
            (Self::Http, _) => HttpProcessor.parse(data)?,
            (Self::Snmp, _) => ApplicationRecord::Snmp(SnmpProcessor.parse(data)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ethertype_dispatch() {
        assert_eq!(network_for(0x0800), Some(NetworkProtocol::Ipv4));
        assert_eq!(network_for(0x86DD), Some(NetworkProtocol::Ipv6));
        assert_eq!(network_for(0x0806), Some(NetworkProtocol::Arp));
        assert_eq!(network_for(0x88CC), None);
    }

    #[test]
    fn icmp_family_follows_network_layer() {
        assert_eq!(
            transport_for(NetworkProtocol::Ipv4, 1),
            Some(TransportProtocol::Icmp)
        );
        assert_eq!(transport_for(NetworkProtocol::Ipv6, 1), None);
        assert_eq!(
            transport_for(NetworkProtocol::Ipv6, 58),
            Some(TransportProtocol::Icmpv6)
        );
        assert_eq!(transport_for(NetworkProtocol::Ipv4, 58), None);
        assert_eq!(transport_for(NetworkProtocol::Arp, 6), None);
    }

    #[test]
    fn port_dispatch_prefers_destination() {
        assert_eq!(
            application_for(TransportProtocol::Udp, 40000, 53),
            Some(ApplicationProtocol::Dns)
        );
        assert_eq!(
            application_for(TransportProtocol::Udp, 53, 40000),
            Some(ApplicationProtocol::Dns)
        );
        assert_eq!(
            application_for(TransportProtocol::Tcp, 53, 80),
            Some(ApplicationProtocol::Http)
        );
        assert_eq!(
            application_for(TransportProtocol::Udp, 162, 5000),
            Some(ApplicationProtocol::Snmp)
        );
        assert_eq!(application_for(TransportProtocol::Udp, 80, 443), None);
        assert_eq!(application_for(TransportProtocol::Tcp, 443, 50000), None);
    }
}
