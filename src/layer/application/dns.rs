use std::fmt;

use crate::engine::cursor::{bit, require, Cursor};
use crate::layer::{LayerError, ProtocolProcessor};

pub const HEADER_LEN: usize = 12;

/// Type code of the EDNS(0) OPT pseudo-record.
pub const TYPE_OPT: u16 = 41;

const POINTER_MASK: u8 = 0xC0;

/// Longest encoded domain name, length octets included.
const MAX_NAME_LEN: usize = 255;

static OPCODES: &[(u8, &str)] = &[
    (0, "Standard query"),
    (1, "Inverse query"),
    (2, "Server status request"),
    (4, "Notify"),
    (5, "Update"),
    (6, "Stateful operation"),
];

static RCODES: &[(u8, &str)] = &[
    (0, "No error"),
    (1, "Format error"),
    (2, "Server failed to complete the DNS request"),
    (3, "Domain name does not exist"),
    (4, "Function not implemented"),
    (5, "The server refused to answer for the query"),
    (6, "Name that should not exist, does exist"),
    (7, "RRset that should not exist, does exist"),
    (8, "Server not authoritative for the zone"),
    (9, "Name not in zone"),
];

fn lookup(table: &'static [(u8, &'static str)], value: u8) -> &'static str {
    table
        .iter()
        .find(|(code, _)| *code == value)
        .map_or("Unknown", |(_, name)| *name)
}

/// The 16-bit flags word of a DNS header (RFC 1035, RFC 4035).
///
///    15  14-11   10  9  8  7  6  5  4  3-0
///   +--+------+--+--+--+--+--+--+--+------+
///   |QR|Opcode|AA|TC|RD|RA| Z|AD|CD|RCODE |
///   +--+------+--+--+--+--+--+--+--+------+
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DnsFlags(pub u16);

impl DnsFlags {
    pub fn is_response(self) -> bool {
        bit(self.0, 15)
    }

    pub fn opcode(self) -> u8 {
        ((self.0 >> 11) & 0x0F) as u8
    }

    pub fn opcode_name(self) -> &'static str {
        lookup(OPCODES, self.opcode())
    }

    pub fn authoritative(self) -> bool {
        bit(self.0, 10)
    }

    pub fn truncated(self) -> bool {
        bit(self.0, 9)
    }

    pub fn recursion_desired(self) -> bool {
        bit(self.0, 8)
    }

    pub fn recursion_available(self) -> bool {
        bit(self.0, 7)
    }

    pub fn reserved(self) -> bool {
        bit(self.0, 6)
    }

    pub fn answer_authenticated(self) -> bool {
        bit(self.0, 5)
    }

    pub fn non_authenticated_data(self) -> bool {
        bit(self.0, 4)
    }

    /// Reply code; only meaningful on responses.
    pub fn rcode(self) -> u8 {
        (self.0 & 0x0F) as u8
    }

    pub fn rcode_name(self) -> &'static str {
        lookup(RCODES, self.rcode())
    }
}

impl fmt::Display for DnsFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |set: bool| u8::from(set);
        let qr = flag(self.is_response());
        let kind = if self.is_response() { "reply" } else { "query" };
        writeln!(f, "  - Response: Message is a {kind} ({qr})")?;
        writeln!(f, "  - Opcode: {} ({})", self.opcode_name(), self.opcode())?;
        if self.is_response() {
            writeln!(f, "  - Authoritative: {}", flag(self.authoritative()))?;
        }
        writeln!(f, "  - Truncated: {}", flag(self.truncated()))?;
        writeln!(f, "  - Recursion desired: {}", flag(self.recursion_desired()))?;
        if self.is_response() {
            writeln!(
                f,
                "  - Recursion available: {}",
                flag(self.recursion_available())
            )?;
        }
        writeln!(f, "  - Reserved: {}", flag(self.reserved()))?;
        if self.is_response() {
            writeln!(
                f,
                "  - Answer authenticated: {}",
                flag(self.answer_authenticated())
            )?;
        }
        writeln!(
            f,
            "  - Non-authenticated data: {}",
            flag(self.non_authenticated_data())
        )?;
        if self.is_response() {
            writeln!(f, "  - Reply code: {} ({})", self.rcode_name(), self.rcode())?;
        }
        Ok(())
    }
}

/// Decodes the domain name starting at `start` and returns it together with
/// the offset of the first byte after the name in the record stream.
///
/// Labels are joined with `.` and the result is fully qualified
/// (`example.com.`); the root name is `.`. Every compression pointer must
/// target an offset below everything decoded so far, so each byte of the
/// message is read at most once per name. The encoded name is capped at
/// 255 octets (RFC 1035 section 2.3.4).
pub fn read_name(message: &[u8], start: usize) -> Result<(String, usize), LayerError> {
    let mut name = String::new();
    let mut pos = start;
    let mut lowest = start;
    let mut resume = None;
    let mut last_pointer = None;
    let mut encoded = 1usize;

    loop {
        let len = *message.get(pos).ok_or(LayerError::TruncatedHeader {
            protocol: "dns",
            needed: pos + 1,
            available: message.len(),
        })?;

        if len & POINTER_MASK == POINTER_MASK {
            let low = *message.get(pos + 1).ok_or(LayerError::TruncatedHeader {
                protocol: "dns",
                needed: pos + 2,
                available: message.len(),
            })?;
            let target = (usize::from(len & !POINTER_MASK) << 8) | usize::from(low);
            if target >= lowest {
                return Err(LayerError::MalformedCompressionPointer {
                    offset: pos,
                    target,
                });
            }
            // Only the first pointer decides where the record continues.
            resume.get_or_insert(pos + 2);
            last_pointer = Some((pos, target));
            lowest = target;
            pos = target;
            continue;
        }

        if len & POINTER_MASK != 0 {
            // 0b01 and 0b10 prefixes are extended label types nobody deploys.
            return Err(LayerError::InvalidDeclaredLength {
                protocol: "dns",
                declared: usize::from(len),
                available: message.len().saturating_sub(pos + 1),
            });
        }

        pos += 1;
        if len == 0 {
            break;
        }

        let label_len = usize::from(len);
        encoded += label_len + 1;
        if encoded > MAX_NAME_LEN {
            return Err(match last_pointer {
                Some((offset, target)) => LayerError::MalformedCompressionPointer { offset, target },
                None => LayerError::InvalidDeclaredLength {
                    protocol: "dns",
                    declared: encoded,
                    available: MAX_NAME_LEN,
                },
            });
        }
        let label = message
            .get(pos..pos + label_len)
            .ok_or(LayerError::InvalidDeclaredLength {
                protocol: "dns",
                declared: label_len,
                available: message.len().saturating_sub(pos),
            })?;
        name.push_str(&String::from_utf8_lossy(label));
        name.push('.');
        pos += label_len;
    }

    if name.is_empty() {
        name.push('.');
    }
    Ok((name, resume.unwrap_or(pos)))
}

/// Which part of the message a record was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Question,
    Answer,
    Authority,
    Additional,
}

impl Section {
    const ORDER: [Section; 4] = [
        Section::Question,
        Section::Answer,
        Section::Authority,
        Section::Additional,
    ];

    pub fn heading(self) -> &'static str {
        match self {
            Self::Question => "Queries",
            Self::Answer => "Answers",
            Self::Authority => "Authoritative nameservers",
            Self::Additional => "Additional records",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsQuestion {
    pub name: String,
    pub qtype: u16,
    pub qclass: u16,
}

/// An answer, authority or additional record. RDATA is kept as a raw view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord<'a> {
    pub name: String,
    pub rtype: u16,
    pub class: u16,
    pub ttl: u32,
    pub rdlength: u16,
    pub rdata: &'a [u8],
}

/// EDNS(0) pseudo-record (RFC 6891). The CLASS and TTL slots of the
/// generic layout carry the requestor's payload size and extended flags.
///
///   +------+-------+---------------+--------+---------+----------+-------+
///   | 0x00 | TYPE  | UDP payload   | EXT    | VERSION | DO|  Z   | RDLEN |
///   | root | = 41  | size          | RCODE  |         |          |       |
///   +------+-------+---------------+--------+---------+----------+-------+
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptRecord<'a> {
    /// 41 on every conforming sender; kept as read.
    pub rtype: u16,
    pub udp_payload_size: u16,
    pub extended_rcode: u8,
    pub version: u8,
    pub dnssec_ok: bool,
    pub z: u16,
    pub rdlength: u16,
    pub rdata: &'a [u8],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DnsRecord<'a> {
    Question(DnsQuestion),
    Answer(ResourceRecord<'a>),
    Authority(ResourceRecord<'a>),
    Additional(ResourceRecord<'a>),
    Opt(OptRecord<'a>),
}

impl DnsRecord<'_> {
    pub fn section(&self) -> Section {
        match self {
            Self::Question(_) => Section::Question,
            Self::Answer(_) => Section::Answer,
            Self::Authority(_) => Section::Authority,
            Self::Additional(_) | Self::Opt(_) => Section::Additional,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Question(question) => &question.name,
            Self::Answer(rr) | Self::Authority(rr) | Self::Additional(rr) => &rr.name,
            Self::Opt(_) => ".",
        }
    }
}

impl fmt::Display for DnsRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Question(q) => write!(f, "  {}: type {} class {}", q.name, q.qtype, q.qclass),
            Self::Answer(rr) | Self::Authority(rr) | Self::Additional(rr) => write!(
                f,
                "  {}: type {} class {} ttl {} rdl {}",
                rr.name, rr.rtype, rr.class, rr.ttl, rr.rdlength
            ),
            Self::Opt(opt) => write!(
                f,
                "  Root: type {} UDP payload size {} extended rcode {} version {} do {} z {:#06x} rdl {}",
                opt.rtype,
                opt.udp_payload_size,
                opt.extended_rcode,
                opt.version,
                u8::from(opt.dnssec_ok),
                opt.z,
                opt.rdlength
            ),
        }
    }
}

/// Walks the four record sections of a message in order, one record per
/// `next`. Decoding happens on demand; the first error ends the walk.
#[derive(Debug, Clone)]
pub struct RecordWalker<'a> {
    message: &'a [u8],
    pos: usize,
    remaining: [u16; 4],
    section: usize,
    failed: bool,
}

impl<'a> RecordWalker<'a> {
    /// `message` is the whole DNS message including its header.
    pub fn new(message: &'a [u8], counts: [u16; 4]) -> Self {
        Self {
            message,
            pos: HEADER_LEN,
            remaining: counts,
            section: 0,
            failed: false,
        }
    }

    /// Offset of the next unread byte.
    pub fn pos(&self) -> usize {
        self.pos
    }

    fn read_question(&mut self) -> Result<DnsRecord<'a>, LayerError> {
        let (name, after) = read_name(self.message, self.pos)?;
        let mut cursor = self.fixed_fields(after, 4)?;
        let truncated = truncated_at(self.message.len(), after + 4);
        let question = DnsQuestion {
            name,
            qtype: cursor.read_u16_be().ok_or_else(truncated)?,
            qclass: cursor.read_u16_be().ok_or_else(truncated)?,
        };
        self.pos = cursor.pos();
        Ok(DnsRecord::Question(question))
    }

    fn read_resource(&mut self, section: Section) -> Result<DnsRecord<'a>, LayerError> {
        let is_root = self.message.get(self.pos) == Some(&0);
        let (name, after) = read_name(self.message, self.pos)?;
        let mut cursor = self.fixed_fields(after, 10)?;
        let truncated = truncated_at(self.message.len(), after + 10);
        let rtype = cursor.read_u16_be().ok_or_else(truncated)?;
        let class = cursor.read_u16_be().ok_or_else(truncated)?;
        let ttl = cursor.read_u32_be().ok_or_else(truncated)?;
        let rdlength = cursor.read_u16_be().ok_or_else(truncated)?;
        let rdata =
            cursor
                .read_exact(usize::from(rdlength))
                .ok_or(LayerError::InvalidDeclaredLength {
                    protocol: "dns",
                    declared: usize::from(rdlength),
                    available: cursor.remaining(),
                })?;
        self.pos = cursor.pos();

        let rr = ResourceRecord {
            name,
            rtype,
            class,
            ttl,
            rdlength,
            rdata,
        };
        Ok(match section {
            // A root owner name in the additional section is the EDNS pseudo-record.
            Section::Additional if is_root => DnsRecord::Opt(OptRecord {
                rtype,
                udp_payload_size: class,
                extended_rcode: (ttl >> 24) as u8,
                version: (ttl >> 16) as u8,
                dnssec_ok: ttl & 0x8000 != 0,
                z: (ttl & 0x7FFF) as u16,
                rdlength,
                rdata,
            }),
            Section::Additional => DnsRecord::Additional(rr),
            Section::Authority => DnsRecord::Authority(rr),
            _ => DnsRecord::Answer(rr),
        })
    }

    /// Cursor at `at`, after checking that `len` fixed bytes follow.
    fn fixed_fields(&self, at: usize, len: usize) -> Result<Cursor<'a>, LayerError> {
        require("dns", self.message, at + len)?;
        Cursor::with_pos(self.message, at).ok_or_else(truncated_at(self.message.len(), at + len))
    }
}

fn truncated_at(available: usize, needed: usize) -> impl Fn() -> LayerError + Copy {
    move || LayerError::TruncatedHeader {
        protocol: "dns",
        needed,
        available,
    }
}

impl<'a> Iterator for RecordWalker<'a> {
    type Item = Result<DnsRecord<'a>, LayerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        while self.section < Section::ORDER.len() && self.remaining[self.section] == 0 {
            self.section += 1;
        }
        let section = *Section::ORDER.get(self.section)?;
        self.remaining[self.section] -= 1;

        let record = match section {
            Section::Question => self.read_question(),
            other => self.read_resource(other),
        };
        self.failed = record.is_err();
        Some(record)
    }
}

/// Represents a parsed DNS message.
///
///   +---------------------+---------------------+
///   |   Transaction ID    |        Flags        |
///   +---------------------+---------------------+
///   |   Question count    |    Answer count     |
///   +---------------------+---------------------+
///   |  Authority count    |  Additional count   |
///   +---------------------+---------------------+
///   |   Questions, Answers, Authority, Additional
///   +-------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsMessage<'a> {
    pub transaction_id: u16,
    pub flags: DnsFlags,
    pub questions: u16,
    pub answers: u16,
    pub authorities: u16,
    pub additionals: u16,
    /// Every declared record, in section order.
    pub records: Vec<DnsRecord<'a>>,
    /// Bytes consumed by the header and all four sections.
    pub consumed: usize,
    message: &'a [u8],
}

impl<'a> DnsMessage<'a> {
    pub fn counts(&self) -> [u16; 4] {
        [
            self.questions,
            self.answers,
            self.authorities,
            self.additionals,
        ]
    }

    /// The raw message, header included.
    pub fn message(&self) -> &'a [u8] {
        self.message
    }

    pub fn section(&self, section: Section) -> impl Iterator<Item = &DnsRecord<'a>> {
        self.records
            .iter()
            .filter(move |record| record.section() == section)
    }
}

/// The DNS processor parses a complete message carried over UDP.
///
/// Refer to the [Wikipedia article on DNS](https://en.wikipedia.org/wiki/Domain_Name_System)
/// for more on the packet format.
pub struct DnsProcessor;

impl<'a> ProtocolProcessor<'a> for DnsProcessor {
    type Record = DnsMessage<'a>;

    fn parse(&self, data: &'a [u8]) -> Result<DnsMessage<'a>, LayerError> {
        require("dns", data, HEADER_LEN)?;

        let truncated = || LayerError::TruncatedHeader {
            protocol: "dns",
            needed: HEADER_LEN,
            available: data.len(),
        };
        let mut cursor = Cursor::new(data);
        let transaction_id = cursor.read_u16_be().ok_or_else(truncated)?;
        let flags = DnsFlags(cursor.read_u16_be().ok_or_else(truncated)?);
        let questions = cursor.read_u16_be().ok_or_else(truncated)?;
        let answers = cursor.read_u16_be().ok_or_else(truncated)?;
        let authorities = cursor.read_u16_be().ok_or_else(truncated)?;
        let additionals = cursor.read_u16_be().ok_or_else(truncated)?;

        let mut walker = RecordWalker::new(data, [questions, answers, authorities, additionals]);
        let records = walker.by_ref().collect::<Result<Vec<_>, _>>()?;

        Ok(DnsMessage {
            transaction_id,
            flags,
            questions,
            answers,
            authorities,
            additionals,
            records,
            consumed: walker.pos(),
            message: data,
        })
    }
}

/// DNS over TCP: a two-byte length prefix precedes the message (RFC 1035
/// section 4.2.2). Compression offsets are relative to the message, not the
/// prefix.
pub struct DnsTcpProcessor;

impl<'a> ProtocolProcessor<'a> for DnsTcpProcessor {
    type Record = DnsMessage<'a>;

    fn parse(&self, data: &'a [u8]) -> Result<DnsMessage<'a>, LayerError> {
        require("dns", data, 2)?;
        let declared = usize::from(u16::from_be_bytes([data[0], data[1]]));
        let message = data
            .get(2..2 + declared)
            .ok_or(LayerError::InvalidDeclaredLength {
                protocol: "dns",
                declared,
                available: data.len() - 2,
            })?;
        DnsProcessor.parse(message)
    }
}

impl fmt::Display for DnsMessage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DNS Message:")?;
        writeln!(f, "- Transaction ID: {:#06x}", self.transaction_id)?;
        writeln!(f, "- Flags: {:#06x}", self.flags.0)?;
        self.flags.fmt(f)?;
        writeln!(f, "- Questions: {}", self.questions)?;
        writeln!(f, "- Answer RRs: {}", self.answers)?;
        writeln!(f, "- Authority RRs: {}", self.authorities)?;
        writeln!(f, "- Additional RRs: {}", self.additionals)?;
        writeln!(
            f,
            "- Payload: {} bytes",
            self.message.len().saturating_sub(HEADER_LEN)
        )?;
        for section in Section::ORDER {
            let mut records = self.section(section).peekable();
            if records.peek().is_none() {
                continue;
            }
            writeln!(f, "- {}:", section.heading())?;
            for record in records {
                writeln!(f, "{record}")?;
            }
        }
        Ok(())
    }
}
