use std::fmt;

use thiserror::Error;

pub mod application; // Layer 7 - DNS, HTTP, SNMP
pub mod datalink; // Layer 2 - Ethernet, ARP
pub mod network; // Layer 3 - IPv4, IPv6
pub mod transport; // Layer 4 - TCP, UDP, ICMP, ICMPv6

/// Position of a decoder in the dissection chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Link,
    Network,
    Transport,
    Application,
}

impl Layer {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::Network => "network",
            Self::Transport => "transport",
            Self::Application => "application",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a single decoder refused its input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayerError {
    /// Fewer bytes than a fixed or minimum header size.
    #[error("{protocol}: truncated header (need {needed} bytes, have {available})")]
    TruncatedHeader {
        protocol: &'static str,
        needed: usize,
        available: usize,
    },

    /// A length or offset field claims more data than the buffer holds,
    /// or less than the protocol minimum.
    #[error("{protocol}: declared length {declared} is invalid for {available} available bytes")]
    InvalidDeclaredLength {
        protocol: &'static str,
        declared: usize,
        available: usize,
    },

    /// A DNS name pointer that loops, points forward or lands outside the message.
    #[error("dns: malformed compression pointer at offset {offset} (target {target})")]
    MalformedCompressionPointer { offset: usize, target: usize },
}

/// A stateless decoder for one protocol header.
///
/// `parse` validates the fixed header against `data` before building the
/// record, so a returned record always describes bytes that exist. The
/// record borrows from `data` for its payload view.
pub trait ProtocolProcessor<'a> {
    type Record;

    fn parse(&self, data: &'a [u8]) -> Result<Self::Record, LayerError>;
}
