use std::fmt;
use std::net::Ipv6Addr;

use super::icmp::{
    describe, write_data, CodeNames, Echo, ExtendedEchoReply, ExtendedEchoRequest, MessageType,
    EXTENDED_ECHO_REPLY, HEADER_LEN,
};
use crate::engine::cursor::{require, Cursor};
use crate::layer::{LayerError, ProtocolProcessor};

static ICMPV6_TYPES: &[MessageType] = &[
    MessageType {
        kind: 1,
        name: "Destination unreachable",
        codes: CodeNames::Indexed(&[
            "No route to destination",
            "Communication with destination administratively prohibited",
            "Beyond scope of source address",
            "Address unreachable",
            "Port unreachable",
            "Source address failed ingress/egress policy",
            "Reject route to destination",
            "Error in Source Routing Header",
        ]),
    },
    MessageType {
        kind: 2,
        name: "Packet too big",
        codes: CodeNames::Fixed("Packet too big"),
    },
    MessageType {
        kind: 3,
        name: "Time exceeded",
        codes: CodeNames::Indexed(&[
            "Hop limit exceeded in transit",
            "Fragment reassembly time exceeded",
        ]),
    },
    MessageType {
        kind: 4,
        name: "Parameter problem",
        codes: CodeNames::Indexed(&[
            "Erroneous header field encountered",
            "Unrecognized Next Header type encountered",
            "Unrecognized IPv6 option encountered",
        ]),
    },
    MessageType {
        kind: 128,
        name: "Echo Request",
        codes: CodeNames::Fixed("Echo Request (Ping)"),
    },
    MessageType {
        kind: 129,
        name: "Echo Reply",
        codes: CodeNames::Fixed("Echo Reply (Ping)"),
    },
    MessageType {
        kind: 133,
        name: "Router Solicitation (NDP)",
        codes: CodeNames::Fixed("Router Solicitation"),
    },
    MessageType {
        kind: 134,
        name: "Router Advertisement (NDP)",
        codes: CodeNames::Fixed("Router Advertisement"),
    },
    MessageType {
        kind: 135,
        name: "Neighbor Solicitation (NDP)",
        codes: CodeNames::Fixed("Neighbor Solicitation"),
    },
    MessageType {
        kind: 136,
        name: "Neighbor Advertisement (NDP)",
        codes: CodeNames::Fixed("Neighbor Advertisement"),
    },
    MessageType {
        kind: 137,
        name: "Redirect Message (NDP)",
        codes: CodeNames::Fixed("Redirect Message"),
    },
    MessageType {
        kind: 160,
        name: "Extended Echo Request",
        codes: CodeNames::Fixed("Extended Echo Request"),
    },
    MessageType {
        kind: 161,
        name: "Extended Echo Reply",
        codes: EXTENDED_ECHO_REPLY,
    },
];

/// Type-dependent body of an ICMPv6 message (RFC 4443, RFC 4861, RFC 8335).
///
/// Neighbor discovery options are left as a raw view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Icmpv6Payload<'a> {
    /// Echo request (128) and reply (129).
    Echo(Echo<'a>),
    /// Destination unreachable (1) and time exceeded (3).
    Unreachable { unused: u32, data: &'a [u8] },
    /// Packet too big (2).
    PacketTooBig { mtu: u32, data: &'a [u8] },
    /// Parameter problem (4).
    ParameterProblem { pointer: u32, data: &'a [u8] },
    RouterSolicitation {
        options: &'a [u8],
    },
    RouterAdvertisement {
        cur_hop_limit: u8,
        managed: bool,
        other: bool,
        router_lifetime: u16,
        reachable_time: u32,
        retrans_timer: u32,
        options: &'a [u8],
    },
    NeighborSolicitation {
        target: Ipv6Addr,
        options: &'a [u8],
    },
    NeighborAdvertisement {
        router: bool,
        solicited: bool,
        override_flag: bool,
        target: Ipv6Addr,
        options: &'a [u8],
    },
    Redirect {
        target: Ipv6Addr,
        destination: Ipv6Addr,
        options: &'a [u8],
    },
    ExtendedEchoRequest(ExtendedEchoRequest<'a>),
    ExtendedEchoReply(ExtendedEchoReply<'a>),
    /// Any other type: the body is not interpreted.
    Data(&'a [u8]),
}

impl<'a> Icmpv6Payload<'a> {
    fn required_len(kind: u8) -> Option<usize> {
        match kind {
            1..=4 | 128 | 129 | 133 | 160 | 161 => Some(4),
            134 => Some(12),
            135 | 136 => Some(20),
            137 => Some(36),
            _ => None,
        }
    }

    fn read(kind: u8, cursor: &mut Cursor<'a>) -> Option<Self> {
        let payload = match kind {
            128 | 129 => Self::Echo(Echo::read(cursor)?),
            1 | 3 => Self::Unreachable {
                unused: cursor.read_u32_be()?,
                data: cursor.rest(),
            },
            2 => Self::PacketTooBig {
                mtu: cursor.read_u32_be()?,
                data: cursor.rest(),
            },
            4 => Self::ParameterProblem {
                pointer: cursor.read_u32_be()?,
                data: cursor.rest(),
            },
            133 => {
                cursor.read_u32_be()?;
                Self::RouterSolicitation {
                    options: cursor.rest(),
                }
            }
            134 => {
                let cur_hop_limit = cursor.read_u8()?;
                let flags = cursor.read_u8()?;
                Self::RouterAdvertisement {
                    cur_hop_limit,
                    managed: flags & 0x80 != 0,
                    other: flags & 0x40 != 0,
                    router_lifetime: cursor.read_u16_be()?,
                    reachable_time: cursor.read_u32_be()?,
                    retrans_timer: cursor.read_u32_be()?,
                    options: cursor.rest(),
                }
            }
            135 => {
                cursor.read_u32_be()?;
                Self::NeighborSolicitation {
                    target: Ipv6Addr::from(cursor.read_array::<16>()?),
                    options: cursor.rest(),
                }
            }
            136 => {
                let flags = cursor.read_u32_be()?;
                Self::NeighborAdvertisement {
                    router: flags & 0x8000_0000 != 0,
                    solicited: flags & 0x4000_0000 != 0,
                    override_flag: flags & 0x2000_0000 != 0,
                    target: Ipv6Addr::from(cursor.read_array::<16>()?),
                    options: cursor.rest(),
                }
            }
            137 => {
                cursor.read_u32_be()?;
                Self::Redirect {
                    target: Ipv6Addr::from(cursor.read_array::<16>()?),
                    destination: Ipv6Addr::from(cursor.read_array::<16>()?),
                    options: cursor.rest(),
                }
            }
            160 => Self::ExtendedEchoRequest(ExtendedEchoRequest::read(cursor)?),
            161 => Self::ExtendedEchoReply(ExtendedEchoReply::read(cursor)?),
            _ => Self::Data(cursor.rest()),
        };
        Some(payload)
    }
}

fn write_options(f: &mut fmt::Formatter<'_>, options: &[u8]) -> fmt::Result {
    writeln!(f, "- Options: ({} bytes) {}", options.len(), hex::encode(options))
}

impl fmt::Display for Icmpv6Payload<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Echo(echo) => echo.fmt(f),
            Self::Unreachable { unused, data } => {
                writeln!(f, "- Unused: {unused:#010x}")?;
                write_data(f, data)
            }
            Self::PacketTooBig { mtu, data } => {
                writeln!(f, "- MTU: {mtu}")?;
                write_data(f, data)
            }
            Self::ParameterProblem { pointer, data } => {
                writeln!(f, "- Pointer: {pointer}")?;
                write_data(f, data)
            }
            Self::RouterSolicitation { options } => write_options(f, options),
            Self::RouterAdvertisement {
                cur_hop_limit,
                managed,
                other,
                router_lifetime,
                reachable_time,
                retrans_timer,
                options,
            } => {
                writeln!(f, "- Cur Hop Limit: {cur_hop_limit}")?;
                writeln!(f, "- Managed: {managed}")?;
                writeln!(f, "- Other: {other}")?;
                writeln!(f, "- Router Lifetime: {router_lifetime}")?;
                writeln!(f, "- Reachable Time: {reachable_time}")?;
                writeln!(f, "- Retrans Timer: {retrans_timer}")?;
                write_options(f, options)
            }
            Self::NeighborSolicitation { target, options } => {
                writeln!(f, "- Target Address: {target}")?;
                write_options(f, options)
            }
            Self::NeighborAdvertisement {
                router,
                solicited,
                override_flag,
                target,
                options,
            } => {
                writeln!(f, "- Router: {router}")?;
                writeln!(f, "- Solicited: {solicited}")?;
                writeln!(f, "- Override: {override_flag}")?;
                writeln!(f, "- Target Address: {target}")?;
                write_options(f, options)
            }
            Self::Redirect {
                target,
                destination,
                options,
            } => {
                writeln!(f, "- Target Address: {target}")?;
                writeln!(f, "- Destination Address: {destination}")?;
                write_options(f, options)
            }
            Self::ExtendedEchoRequest(request) => request.fmt(f),
            Self::ExtendedEchoReply(reply) => reply.fmt(f),
            Self::Data(data) => write_data(f, data),
        }
    }
}

/// Represents an ICMPv6 message.
///
/// The common header matches ICMP; the rest depends on the type.
///
///   +---------------------------------------------------------------+
///   |     Type      |     Code      |           Checksum            |
///   +---------------------------------------------------------------+
///   |                     Message Body (variable)                   |
///   +---------------------------------------------------------------+
///
/// The checksum covers an IPv6 pseudo header and is reported as found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Icmpv6Segment<'a> {
    pub icmp_type: u8,
    pub icmp_code: u8,
    pub checksum: u16,
    pub payload: Icmpv6Payload<'a>,
}

impl Icmpv6Segment<'_> {
    pub fn type_name(&self) -> &'static str {
        describe(ICMPV6_TYPES, self.icmp_type, self.icmp_code).0
    }

    pub fn code_name(&self) -> &'static str {
        describe(ICMPV6_TYPES, self.icmp_type, self.icmp_code).1
    }
}

pub struct Icmpv6Processor;

impl<'a> ProtocolProcessor<'a> for Icmpv6Processor {
    type Record = Icmpv6Segment<'a>;

    fn parse(&self, data: &'a [u8]) -> Result<Icmpv6Segment<'a>, LayerError> {
        require("icmpv6", data, HEADER_LEN)?;
        let icmp_type = data[0];
        if let Some(body) = Icmpv6Payload::required_len(icmp_type) {
            require("icmpv6", data, HEADER_LEN + body)?;
        }

        let mut cursor = Cursor::new(data);
        cursor.advance(2);
        let truncated = || LayerError::TruncatedHeader {
            protocol: "icmpv6",
            needed: HEADER_LEN,
            available: data.len(),
        };
        let checksum = cursor.read_u16_be().ok_or_else(truncated)?;
        let payload = Icmpv6Payload::read(icmp_type, &mut cursor).ok_or_else(truncated)?;

        Ok(Icmpv6Segment {
            icmp_type,
            icmp_code: data[1],
            checksum,
            payload,
        })
    }
}

impl fmt::Display for Icmpv6Segment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (type_name, code_name) = describe(ICMPV6_TYPES, self.icmp_type, self.icmp_code);
        writeln!(f, "ICMPv6 Segment:")?;
        writeln!(f, "- Type: {} ({})", self.icmp_type, type_name)?;
        writeln!(f, "- Code: {} ({})", self.icmp_code, code_name)?;
        writeln!(f, "- Checksum: {:#06x}", self.checksum)?;
        self.payload.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_echo_reply() {
        let bytes = [129, 0, 0xab, 0xcd, 0x00, 0x2a, 0x00, 0x03, 0x61];
        let icmp = Icmpv6Processor.parse(&bytes).expect("echo reply");
        assert_eq!(icmp.type_name(), "Echo Reply");
        assert_eq!(icmp.checksum, 0xabcd);
        assert_eq!(
            icmp.payload,
            Icmpv6Payload::Echo(Echo {
                identifier: 42,
                sequence: 3,
                data: b"a",
            })
        );
    }

    #[test]
    fn test_packet_too_big_mtu() {
        let bytes = [2, 0, 0, 0, 0x00, 0x00, 0x05, 0xdc, 0x60];
        let icmp = Icmpv6Processor.parse(&bytes).expect("packet too big");
        assert!(matches!(
            icmp.payload,
            Icmpv6Payload::PacketTooBig { mtu: 1500, .. }
        ));
        assert!(icmp.to_string().contains("- MTU: 1500\n"));
    }

    #[test]
    fn test_neighbor_solicitation_target() {
        let target: Ipv6Addr = "fe80::1".parse().expect("addr");
        let mut bytes = vec![135, 0, 0, 0, 0, 0, 0, 0];
        bytes.extend_from_slice(&target.octets());
        bytes.extend_from_slice(&[1, 1, 0, 0x11, 0x22, 0x33, 0x44, 0x55]);
        let icmp = Icmpv6Processor.parse(&bytes).expect("neighbor solicitation");
        assert_eq!(icmp.code_name(), "Neighbor Solicitation");
        let Icmpv6Payload::NeighborSolicitation { target: parsed, options } = icmp.payload else {
            panic!("expected neighbor solicitation");
        };
        assert_eq!(parsed, target);
        assert_eq!(options.len(), 8);
    }

    #[test]
    fn test_neighbor_advertisement_flags() {
        let mut bytes = vec![136, 0, 0, 0, 0b0110_0000, 0, 0, 0];
        bytes.extend_from_slice(&Ipv6Addr::LOCALHOST.octets());
        let icmp = Icmpv6Processor.parse(&bytes).expect("neighbor advertisement");
        assert!(matches!(
            icmp.payload,
            Icmpv6Payload::NeighborAdvertisement {
                router: false,
                solicited: true,
                override_flag: true,
                ..
            }
        ));
    }

    #[test]
    fn test_router_advertisement() {
        let bytes = [
            134, 0, 0, 0, 64, 0xc0, 0x07, 0x08, 0, 0, 0, 0, 0, 0, 0, 0,
        ];
        let icmp = Icmpv6Processor.parse(&bytes).expect("router advertisement");
        assert!(matches!(
            icmp.payload,
            Icmpv6Payload::RouterAdvertisement {
                cur_hop_limit: 64,
                managed: true,
                other: true,
                router_lifetime: 1800,
                ..
            }
        ));
    }

    #[test]
    fn test_redirect_needs_both_addresses() {
        let mut bytes = vec![137, 0, 0, 0, 0, 0, 0, 0];
        bytes.extend_from_slice(&Ipv6Addr::LOCALHOST.octets());
        assert_eq!(
            Icmpv6Processor.parse(&bytes),
            Err(LayerError::TruncatedHeader {
                protocol: "icmpv6",
                needed: 40,
                available: 24
            })
        );
    }

    #[test]
    fn test_destination_unreachable_code_table() {
        let icmp = Icmpv6Processor
            .parse(&[1, 4, 0, 0, 0, 0, 0, 0])
            .expect("unreachable");
        assert_eq!(icmp.type_name(), "Destination unreachable");
        assert_eq!(icmp.code_name(), "Port unreachable");
        let icmp = Icmpv6Processor
            .parse(&[1, 40, 0, 0, 0, 0, 0, 0])
            .expect("unmapped code");
        assert_eq!(icmp.code_name(), "Unknown");
    }

    #[test]
    fn test_unknown_type_is_opaque() {
        let icmp = Icmpv6Processor.parse(&[143, 0, 0, 0, 1, 2]).expect("mld report");
        assert_eq!(icmp.type_name(), "Unknown");
        assert_eq!(icmp.payload, Icmpv6Payload::Data(&[1, 2]));
    }

    #[test]
    fn test_render_header() {
        let bytes = [128, 0, 0x12, 0x34, 0, 1, 0, 2];
        let text = Icmpv6Processor.parse(&bytes).expect("parse").to_string();
        assert_eq!(
            text,
            "ICMPv6 Segment:\n\
             - Type: 128 (Echo Request)\n\
             - Code: 0 (Echo Request (Ping))\n\
             - Checksum: 0x1234\n\
             - Identifier: 1\n\
             - Sequence Number: 2\n\
             - Data: (0 bytes) \n"
        );
    }
}
