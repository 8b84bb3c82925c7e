//! The datalink layer (Layer 2) modules.
//! Ethernet II framing plus ARP, which rides directly on Ethernet and has no
//! successor layer.

pub mod arp;
pub mod ethernet;

use std::fmt;

pub use arp::{ArpOperation, ArpPacket, ArpProcessor};
pub use ethernet::{EthernetFrame, EthernetProcessor};

/// 48-bit IEEE 802 hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    pub fn is_broadcast(&self) -> bool {
        self.0 == [0xff; 6]
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(octets: [u8; 6]) -> Self {
        Self(octets)
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}
