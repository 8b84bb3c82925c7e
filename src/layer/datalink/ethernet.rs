use std::fmt;

use super::MacAddr;
use crate::engine::constants::ethertype_name;
use crate::engine::cursor::{require, Cursor};
use crate::layer::{LayerError, ProtocolProcessor};

pub const HEADER_LEN: usize = 14;

/// An Ethernet II frame header.
///
///   +-------------------+-------------------+-----------+-------------+
///   | Destination (6)   | Source (6)        | Type (2)  | Payload ... |
///   +-------------------+-------------------+-----------+-------------+
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetFrame<'a> {
    pub destination: MacAddr,
    pub source: MacAddr,
    pub ethertype: u16,
    pub payload: &'a [u8],
}

impl EthernetFrame<'_> {
    pub fn ethertype_name(&self) -> &'static str {
        ethertype_name(self.ethertype)
    }
}

pub struct EthernetProcessor;

impl<'a> ProtocolProcessor<'a> for EthernetProcessor {
    type Record = EthernetFrame<'a>;

    fn parse(&self, data: &'a [u8]) -> Result<EthernetFrame<'a>, LayerError> {
        require("ethernet", data, HEADER_LEN)?;

        let mut cursor = Cursor::new(data);
        let truncated = || LayerError::TruncatedHeader {
            protocol: "ethernet",
            needed: HEADER_LEN,
            available: data.len(),
        };
        let destination = cursor.read_array::<6>().ok_or_else(truncated)?;
        let source = cursor.read_array::<6>().ok_or_else(truncated)?;
        let ethertype = cursor.read_u16_be().ok_or_else(truncated)?;

        Ok(EthernetFrame {
            destination: MacAddr(destination),
            source: MacAddr(source),
            ethertype,
            payload: cursor.rest(),
        })
    }
}

impl fmt::Display for EthernetFrame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ethernet Frame:")?;
        writeln!(f, "- DstMAC: {}", self.destination)?;
        writeln!(f, "- SrcMAC: {}", self.source)?;
        writeln!(f, "- EtherType: {:#06x} ({})", self.ethertype, self.ethertype_name())?;
        writeln!(
            f,
            "- Payload: ({} bytes) {}",
            self.payload.len(),
            hex::encode(self.payload)
        )
    }
}
