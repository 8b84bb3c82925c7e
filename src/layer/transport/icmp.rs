use std::fmt;
use std::net::Ipv4Addr;

use crate::engine::cursor::{require, Cursor};
use crate::layer::{LayerError, ProtocolProcessor};

/// Type, code and checksum.
pub const HEADER_LEN: usize = 4;

/// How the code byte of a message type is described.
pub(crate) enum CodeNames {
    /// One description regardless of the code value.
    Fixed(&'static str),
    /// Description indexed by code; codes past the end are unknown.
    Indexed(&'static [&'static str]),
}

pub(crate) struct MessageType {
    pub kind: u8,
    pub name: &'static str,
    pub codes: CodeNames,
}

/// Resolves the (type, code) description pair from a static table.
pub(crate) fn describe(
    table: &'static [MessageType],
    kind: u8,
    code: u8,
) -> (&'static str, &'static str) {
    let Some(entry) = table.iter().find(|entry| entry.kind == kind) else {
        return ("Unknown", "Unknown");
    };
    let code_name = match entry.codes {
        CodeNames::Fixed(name) => name,
        CodeNames::Indexed(names) => names.get(code as usize).copied().unwrap_or("Unknown"),
    };
    (entry.name, code_name)
}

const EXTENDED_ECHO_REPLY_CODES: &[&str] = &[
    "No Error",
    "Malformed Query",
    "No Such Interface",
    "No Such Table Entry",
    "Multiple Interfaces Satisfy Query",
];

pub(crate) const EXTENDED_ECHO_REPLY: CodeNames = CodeNames::Indexed(EXTENDED_ECHO_REPLY_CODES);

static ICMP_TYPES: &[MessageType] = &[
    MessageType {
        kind: 0,
        name: "Echo Reply",
        codes: CodeNames::Fixed("Echo Reply (Ping)"),
    },
    MessageType {
        kind: 3,
        name: "Destination Unreachable",
        codes: CodeNames::Indexed(&[
            "Destination network unreachable",
            "Destination host unreachable",
            "Destination protocol unreachable",
            "Destination port unreachable",
            "Fragmentation required, and DF flag set",
            "Source route failed",
            "Destination network unknown",
            "Destination host unknown",
            "Source host isolated",
            "Network administratively prohibited",
            "Host administratively prohibited",
            "Network unreachable for ToS",
            "Host unreachable for ToS",
            "Communication administratively prohibited",
            "Host Precedence Violation",
            "Precedence cutoff in effect",
        ]),
    },
    MessageType {
        kind: 5,
        name: "Redirect Message",
        codes: CodeNames::Indexed(&[
            "Redirect Datagram for the Network",
            "Redirect Datagram for the Host",
            "Redirect Datagram for the ToS & network",
            "Redirect Datagram for the ToS & host",
        ]),
    },
    MessageType {
        kind: 8,
        name: "Echo Request",
        codes: CodeNames::Fixed("Echo Request (Ping)"),
    },
    MessageType {
        kind: 9,
        name: "Router Advertisement",
        codes: CodeNames::Fixed("Router Advertisement"),
    },
    MessageType {
        kind: 10,
        name: "Router Solicitation",
        codes: CodeNames::Fixed("Router discovery/selection/solicitation"),
    },
    MessageType {
        kind: 11,
        name: "Time Exceeded",
        codes: CodeNames::Indexed(&[
            "Time to live (TTL) expired in transit",
            "Fragment reassembly time exceeded",
        ]),
    },
    MessageType {
        kind: 12,
        name: "Parameter Problem: Bad IP header",
        codes: CodeNames::Indexed(&[
            "Pointer indicates the error",
            "Missing a required option",
            "Bad length",
        ]),
    },
    MessageType {
        kind: 13,
        name: "Timestamp",
        codes: CodeNames::Fixed("Timestamp"),
    },
    MessageType {
        kind: 14,
        name: "Timestamp Reply",
        codes: CodeNames::Fixed("Timestamp Reply"),
    },
    MessageType {
        kind: 42,
        name: "Extended Echo Request",
        codes: CodeNames::Fixed("Extended Echo Request"),
    },
    MessageType {
        kind: 43,
        name: "Extended Echo Reply",
        codes: EXTENDED_ECHO_REPLY,
    },
];

/// Identifier, sequence number and trailing data shared by echo messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Echo<'a> {
    pub identifier: u16,
    pub sequence: u16,
    pub data: &'a [u8],
}

impl<'a> Echo<'a> {
    pub(crate) fn read(cursor: &mut Cursor<'a>) -> Option<Self> {
        Some(Self {
            identifier: cursor.read_u16_be()?,
            sequence: cursor.read_u16_be()?,
            data: cursor.rest(),
        })
    }
}

impl fmt::Display for Echo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "- Identifier: {}", self.identifier)?;
        writeln!(f, "- Sequence Number: {}", self.sequence)?;
        write_data(f, self.data)
    }
}

/// RFC 8335 extended echo request.
///
///   +-------------------------------+---------------+-------------+-+
///   |         Identifier            |Sequence Number|   Reserved  |L|
///   +-------------------------------+---------------+-------------+-+
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedEchoRequest<'a> {
    pub identifier: u16,
    pub sequence: u8,
    /// Probed interface resides on the proxy node.
    pub local: bool,
    /// Extension structure naming the probed interface.
    pub data: &'a [u8],
}

impl<'a> ExtendedEchoRequest<'a> {
    pub(crate) fn read(cursor: &mut Cursor<'a>) -> Option<Self> {
        let identifier = cursor.read_u16_be()?;
        let sequence = cursor.read_u8()?;
        let flags = cursor.read_u8()?;
        Some(Self {
            identifier,
            sequence,
            local: flags & 0x01 != 0,
            data: cursor.rest(),
        })
    }
}

impl fmt::Display for ExtendedEchoRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "- Identifier: {}", self.identifier)?;
        writeln!(f, "- Sequence Number: {}", self.sequence)?;
        writeln!(f, "- Local: {}", self.local)?;
        write_data(f, self.data)
    }
}

/// RFC 8335 extended echo reply.
///
///   +-------------------------------+---------------+-----+---+-+-+-+
///   |         Identifier            |Sequence Number|State|Res|A|4|6|
///   +-------------------------------+---------------+-----+---+-+-+-+
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedEchoReply<'a> {
    pub identifier: u16,
    pub sequence: u8,
    /// Neighbor reachability state (only meaningful for proxied probes).
    pub state: u8,
    pub active: bool,
    pub ipv4: bool,
    pub ipv6: bool,
    pub data: &'a [u8],
}

impl<'a> ExtendedEchoReply<'a> {
    pub(crate) fn read(cursor: &mut Cursor<'a>) -> Option<Self> {
        let identifier = cursor.read_u16_be()?;
        let sequence = cursor.read_u8()?;
        let flags = cursor.read_u8()?;
        Some(Self {
            identifier,
            sequence,
            state: flags >> 5,
            active: flags & 0b100 != 0,
            ipv4: flags & 0b010 != 0,
            ipv6: flags & 0b001 != 0,
            data: cursor.rest(),
        })
    }
}

impl fmt::Display for ExtendedEchoReply<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "- Identifier: {}", self.identifier)?;
        writeln!(f, "- Sequence Number: {}", self.sequence)?;
        writeln!(f, "- State: {}", self.state)?;
        writeln!(f, "- Active: {}", self.active)?;
        writeln!(f, "- IPv4: {}", self.ipv4)?;
        writeln!(f, "- IPv6: {}", self.ipv6)?;
        write_data(f, self.data)
    }
}

pub(crate) fn write_data(f: &mut fmt::Formatter<'_>, data: &[u8]) -> fmt::Result {
    writeln!(f, "- Data: ({} bytes) {}", data.len(), hex::encode(data))
}

/// Type-dependent body of an ICMP message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IcmpPayload<'a> {
    /// Echo request (8) and reply (0).
    Echo(Echo<'a>),
    /// Destination unreachable (3) and time exceeded (11): an unused word
    /// followed by the offending datagram's header.
    Unreachable { reserved: u32, data: &'a [u8] },
    /// Redirect (5).
    Redirect { gateway: Ipv4Addr, data: &'a [u8] },
    /// Timestamp (13) and timestamp reply (14).
    Timestamp {
        identifier: u16,
        sequence: u16,
        originate: u32,
        receive: u32,
        transmit: u32,
    },
    ExtendedEchoRequest(ExtendedEchoRequest<'a>),
    ExtendedEchoReply(ExtendedEchoReply<'a>),
    /// Any other type: the body is not interpreted.
    Data(&'a [u8]),
}

impl<'a> IcmpPayload<'a> {
    /// Minimum body size for the structured layouts; `None` for opaque types.
    fn required_len(kind: u8) -> Option<usize> {
        match kind {
            0 | 3 | 5 | 8 | 11 | 42 | 43 => Some(4),
            13 | 14 => Some(16),
            _ => None,
        }
    }

    fn read(kind: u8, cursor: &mut Cursor<'a>) -> Option<Self> {
        let payload = match kind {
            0 | 8 => Self::Echo(Echo::read(cursor)?),
            3 | 11 => Self::Unreachable {
                reserved: cursor.read_u32_be()?,
                data: cursor.rest(),
            },
            5 => Self::Redirect {
                gateway: Ipv4Addr::from(cursor.read_array::<4>()?),
                data: cursor.rest(),
            },
            13 | 14 => Self::Timestamp {
                identifier: cursor.read_u16_be()?,
                sequence: cursor.read_u16_be()?,
                originate: cursor.read_u32_be()?,
                receive: cursor.read_u32_be()?,
                transmit: cursor.read_u32_be()?,
            },
            42 => Self::ExtendedEchoRequest(ExtendedEchoRequest::read(cursor)?),
            43 => Self::ExtendedEchoReply(ExtendedEchoReply::read(cursor)?),
            _ => Self::Data(cursor.rest()),
        };
        Some(payload)
    }
}

impl fmt::Display for IcmpPayload<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Echo(echo) => echo.fmt(f),
            Self::Unreachable { reserved, data } => {
                writeln!(f, "- Reserved: {reserved:#010x}")?;
                write_data(f, data)
            }
            Self::Redirect { gateway, data } => {
                writeln!(f, "- Gateway Address: {gateway}")?;
                write_data(f, data)
            }
            Self::Timestamp {
                identifier,
                sequence,
                originate,
                receive,
                transmit,
            } => {
                writeln!(f, "- Identifier: {identifier}")?;
                writeln!(f, "- Sequence Number: {sequence}")?;
                writeln!(f, "- Originate Timestamp: {originate}")?;
                writeln!(f, "- Receive Timestamp: {receive}")?;
                writeln!(f, "- Transmit Timestamp: {transmit}")
            }
            Self::ExtendedEchoRequest(request) => request.fmt(f),
            Self::ExtendedEchoReply(reply) => reply.fmt(f),
            Self::Data(data) => write_data(f, data),
        }
    }
}

/// Represents an ICMP message.
///
///   0                   1                   2                   3
///    0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
///   +---------------------------------------------------------------+
///   |     Type      |     Code      |           Checksum            |
///   +---------------------------------------------------------------+
///   |           Rest of Header (variable, depends on type and code) |
///   +---------------------------------------------------------------+
///   |                       Data (variable length)                  |
///   +---------------------------------------------------------------+
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcmpSegment<'a> {
    pub icmp_type: u8,
    pub icmp_code: u8,
    pub checksum: u16,
    pub payload: IcmpPayload<'a>,
}

impl IcmpSegment<'_> {
    pub fn type_name(&self) -> &'static str {
        describe(ICMP_TYPES, self.icmp_type, self.icmp_code).0
    }

    pub fn code_name(&self) -> &'static str {
        describe(ICMP_TYPES, self.icmp_type, self.icmp_code).1
    }
}

/// Processor for ICMP messages. The checksum is reported, not verified.
pub struct IcmpProcessor;

impl<'a> ProtocolProcessor<'a> for IcmpProcessor {
    type Record = IcmpSegment<'a>;

    fn parse(&self, data: &'a [u8]) -> Result<IcmpSegment<'a>, LayerError> {
        require("icmp", data, HEADER_LEN)?;
        let icmp_type = data[0];
        if let Some(body) = IcmpPayload::required_len(icmp_type) {
            require("icmp", data, HEADER_LEN + body)?;
        }

        let mut cursor = Cursor::new(data);
        cursor.advance(2);
        let truncated = || LayerError::TruncatedHeader {
            protocol: "icmp",
            needed: HEADER_LEN,
            available: data.len(),
        };
        let checksum = cursor.read_u16_be().ok_or_else(truncated)?;
        let payload = IcmpPayload::read(icmp_type, &mut cursor).ok_or_else(truncated)?;

        Ok(IcmpSegment {
            icmp_type,
            icmp_code: data[1],
            checksum,
            payload,
        })
    }
}

impl fmt::Display for IcmpSegment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (type_name, code_name) = describe(ICMP_TYPES, self.icmp_type, self.icmp_code);
        writeln!(f, "ICMP Segment:")?;
        writeln!(f, "- Type: {} ({})", self.icmp_type, type_name)?;
        writeln!(f, "- Code: {} ({})", self.icmp_code, code_name)?;
        writeln!(f, "- Checksum: {:#06x}", self.checksum)?;
        self.payload.fmt(f)
    }
}
