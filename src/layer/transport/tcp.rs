use std::fmt;

use crate::engine::cursor::{bit, require, Cursor};
use crate::layer::{LayerError, ProtocolProcessor};

pub const MIN_HEADER_LEN: usize = 20;

/// TCP control bits (RFC 793, RFC 3168, RFC 3540).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TcpFlags {
    pub ns: bool,  // 0x100 - ECN-nonce concealment protection
    pub cwr: bool, // 0x80 - Congestion Window Reduced
    pub ece: bool, // 0x40 - ECN-Echo
    pub urg: bool, // 0x20 - Urgent pointer field is significant
    pub ack: bool, // 0x10 - Acknowledgment field is significant
    pub psh: bool, // 0x08 - Push function
    pub rst: bool, // 0x04 - Reset the connection
    pub syn: bool, // 0x02 - Synchronize sequence numbers
    pub fin: bool, // 0x01 - No more data from sender
}

impl TcpFlags {
    /// Decodes the low nine bits of the offset/flags word.
    pub fn from_bits(word: u16) -> Self {
        Self {
            ns: bit(word, 8),
            cwr: bit(word, 7),
            ece: bit(word, 6),
            urg: bit(word, 5),
            ack: bit(word, 4),
            psh: bit(word, 3),
            rst: bit(word, 2),
            syn: bit(word, 1),
            fin: bit(word, 0),
        }
    }

    pub fn bits(self) -> u16 {
        [
            self.fin, self.syn, self.rst, self.psh, self.ack, self.urg, self.ece, self.cwr,
            self.ns,
        ]
        .iter()
        .enumerate()
        .fold(0, |acc, (i, set)| acc | (u16::from(*set) << i))
    }
}

impl fmt::Display for TcpFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (self.ns, "NS"),
            (self.cwr, "CWR"),
            (self.ece, "ECE"),
            (self.urg, "URG"),
            (self.ack, "ACK"),
            (self.psh, "PSH"),
            (self.rst, "RST"),
            (self.syn, "SYN"),
            (self.fin, "FIN"),
        ];
        let set: Vec<&str> = names
            .iter()
            .filter(|(on, _)| *on)
            .map(|(_, name)| *name)
            .collect();
        write!(f, "{:#05x} ({})", self.bits(), set.join(", "))
    }
}

/// Represents a TCP segment.
///
/// The TCP header format is defined in RFC 793 and consists of:
/// - Source Port (16 bits)
/// - Destination Port (16 bits)
/// - Sequence Number (32 bits)
/// - Acknowledgment Number (32 bits)
/// - Data Offset (4 bits): Size of TCP header in 32-bit words
/// - Reserved (3 bits)
/// - Flags (9 bits): NS, CWR, ECE, URG, ACK, PSH, RST, SYN, FIN
/// - Window Size (16 bits)
/// - Checksum (16 bits)
/// - Urgent Pointer (16 bits)
/// - Options (variable length, optional)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpSegment<'a> {
    pub source_port: u16,
    pub destination_port: u16,
    pub sequence_number: u32,
    pub acknowledgment_number: u32,
    pub data_offset: u8,
    pub flags: TcpFlags,
    pub window_size: u16,
    pub checksum: u16,
    pub urgent_pointer: u16,
    pub options: &'a [u8],
    pub payload: &'a [u8],
}

impl TcpSegment<'_> {
    pub fn header_len(&self) -> usize {
        self.data_offset as usize * 4
    }
}

/// Processor for TCP segments.
pub struct TcpProcessor;

impl<'a> ProtocolProcessor<'a> for TcpProcessor {
    type Record = TcpSegment<'a>;

    fn parse(&self, data: &'a [u8]) -> Result<TcpSegment<'a>, LayerError> {
        require("tcp", data, MIN_HEADER_LEN)?;

        let truncated = || LayerError::TruncatedHeader {
            protocol: "tcp",
            needed: MIN_HEADER_LEN,
            available: data.len(),
        };
        let mut cursor = Cursor::new(data);
        let source_port = cursor.read_u16_be().ok_or_else(truncated)?;
        let destination_port = cursor.read_u16_be().ok_or_else(truncated)?;
        let sequence_number = cursor.read_u32_be().ok_or_else(truncated)?;
        let acknowledgment_number = cursor.read_u32_be().ok_or_else(truncated)?;
        let offset_flags = cursor.read_u16_be().ok_or_else(truncated)?;
        let window_size = cursor.read_u16_be().ok_or_else(truncated)?;
        let checksum = cursor.read_u16_be().ok_or_else(truncated)?;
        let urgent_pointer = cursor.read_u16_be().ok_or_else(truncated)?;

        let data_offset = (offset_flags >> 12) as u8;
        let header_len = data_offset as usize * 4;
        if header_len < MIN_HEADER_LEN || header_len > data.len() {
            return Err(LayerError::InvalidDeclaredLength {
                protocol: "tcp",
                declared: header_len,
                available: data.len(),
            });
        }

        Ok(TcpSegment {
            source_port,
            destination_port,
            sequence_number,
            acknowledgment_number,
            data_offset,
            flags: TcpFlags::from_bits(offset_flags & 0x01FF),
            window_size,
            checksum,
            urgent_pointer,
            options: &data[MIN_HEADER_LEN..header_len],
            payload: &data[header_len..],
        })
    }
}

impl fmt::Display for TcpSegment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TCP Segment:")?;
        writeln!(f, "- SrcPort: {}", self.source_port)?;
        writeln!(f, "- DstPort: {}", self.destination_port)?;
        writeln!(f, "- Sequence Number: {}", self.sequence_number)?;
        writeln!(f, "- Acknowledgment Number: {}", self.acknowledgment_number)?;
        writeln!(
            f,
            "- Data Offset: {} ({} bytes)",
            self.data_offset,
            self.header_len()
        )?;
        writeln!(f, "- Flags: {}", self.flags)?;
        writeln!(f, "- Window Size: {}", self.window_size)?;
        writeln!(f, "- Checksum: {:#06x}", self.checksum)?;
        writeln!(f, "- Urgent Pointer: {}", self.urgent_pointer)?;
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

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_tcp_segment() -> Vec<u8> {
        vec![
            0x12, 0x34, // Source port: 4660
            0x00, 0x50, // Destination port: 80
            0x00, 0x00, 0x00, 0x01, // Sequence number: 1
            0x00, 0x00, 0x00, 0x02, // Acknowledgment number: 2
            0x50, 0x10, // Data offset: 5, Flags: ACK
            0x10, 0x00, // Window size: 4096
            0x00, 0x00, // Checksum
            0x00, 0x00, // Urgent pointer
            0x01, 0x02, 0x03, 0x04, // Payload
        ]
    }

    fn create_test_tcp_segment_with_options() -> Vec<u8> {
        vec![
            0x12, 0x34, // Source port: 4660
            0x00, 0x50, // Destination port: 80
            0x00, 0x00, 0x00, 0x01, // Sequence number: 1
            0x00, 0x00, 0x00, 0x02, // Acknowledgment number: 2
            0x60, 0x02, // Data offset: 6 (24 bytes), Flags: SYN
            0x20, 0x00, // Window size: 8192
            0x00, 0x00, // Checksum
            0x00, 0x00, // Urgent pointer
            0x02, 0x04, 0x05, 0xb4, // MSS Option: 1460
        ]
    }

    #[test]
    fn test_parse_valid_tcp() {
        let bytes = create_test_tcp_segment();
        let tcp = TcpProcessor
            .parse(&bytes)
            .expect("TCP segment should parse successfully");

        assert_eq!(tcp.source_port, 4660);
        assert_eq!(tcp.destination_port, 80);
        assert_eq!(tcp.sequence_number, 1);
        assert_eq!(tcp.acknowledgment_number, 2);
        assert_eq!(tcp.data_offset, 5);
        assert_eq!(tcp.window_size, 4096);
        assert!(tcp.flags.ack);
        assert!(!tcp.flags.syn);
        assert!(tcp.options.is_empty());
        assert_eq!(tcp.payload, &[1, 2, 3, 4]);
    }

    #[test]
    fn test_parse_tcp_with_options() {
        let bytes = create_test_tcp_segment_with_options();
        let tcp = TcpProcessor
            .parse(&bytes)
            .expect("TCP segment with options should parse successfully");

        assert_eq!(tcp.data_offset, 6);
        assert!(tcp.flags.syn);
        assert!(!tcp.flags.ack);
        assert_eq!(tcp.options, &[0x02, 0x04, 0x05, 0xb4]);
        assert!(tcp.payload.is_empty());
    }

    #[test]
    fn test_all_nine_flags() {
        let mut bytes = create_test_tcp_segment();
        bytes[12] = 0x51;
        bytes[13] = 0xff;
        let flags = TcpProcessor.parse(&bytes).expect("parse").flags;
        assert!(flags.ns && flags.cwr && flags.ece && flags.urg && flags.ack);
        assert!(flags.psh && flags.rst && flags.syn && flags.fin);
        assert_eq!(flags.bits(), 0x1ff);
    }

    #[test]
    fn test_parse_invalid_data_offset() {
        let mut bytes = create_test_tcp_segment();
        bytes[12] = 0x30;
        assert!(matches!(
            TcpProcessor.parse(&bytes),
            Err(LayerError::InvalidDeclaredLength { declared: 12, .. })
        ));
    }

    #[test]
    fn test_data_offset_beyond_buffer() {
        let mut bytes = create_test_tcp_segment();
        bytes[12] = 0xf0;
        assert_eq!(
            TcpProcessor.parse(&bytes),
            Err(LayerError::InvalidDeclaredLength {
                protocol: "tcp",
                declared: 60,
                available: 24
            })
        );
    }

    #[test]
    fn test_short_segment() {
        let result = TcpProcessor.parse(&[0, 80, 0, 80, 0, 0, 0, 1]);
        assert!(matches!(
            result,
            Err(LayerError::TruncatedHeader { needed: 20, available: 8, .. })
        ));
    }

    #[test]
    fn test_render_flags() {
        let bytes = create_test_tcp_segment_with_options();
        let text = TcpProcessor.parse(&bytes).expect("parse").to_string();
        assert!(text.starts_with("TCP Segment:\n- SrcPort: 4660\n- DstPort: 80\n"));
        assert!(text.contains("- Flags: 0x002 (SYN)\n"));
        assert!(text.contains("- Options: (4 bytes) 020405b4\n"));
    }
}
