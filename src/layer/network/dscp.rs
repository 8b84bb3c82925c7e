//! DSCP codepoint classes (RFC 4594) and ECN, the two halves of the IPv4
//! type-of-service byte and the IPv6 traffic class.

use std::fmt;

/// Codepoint to service class name.
static DSCP_CLASSES: &[(u8, &str)] = &[
    (0, "Standard (DF)"),
    (1, "Lower-effort (LE)"),
    (48, "Network control (CS6)"),
    (46, "Telephony (EF)"),
    (40, "Signaling (CS5)"),
    (34, "Multimedia conferencing (AF41, AF42, AF43)"),
    (36, "Multimedia conferencing (AF41, AF42, AF43)"),
    (38, "Multimedia conferencing (AF41, AF42, AF43)"),
    (32, "Real-time interactive (CS4)"),
    (26, "Multimedia streaming (AF31, AF32, AF33)"),
    (28, "Multimedia streaming (AF31, AF32, AF33)"),
    (30, "Multimedia streaming (AF31, AF32, AF33)"),
    (24, "Broadcast video (CS3)"),
    (18, "Low-latency data (AF21, AF22, AF23)"),
    (20, "Low-latency data (AF21, AF22, AF23)"),
    (22, "Low-latency data (AF21, AF22, AF23)"),
    (16, "OAM (CS2)"),
    (10, "High-throughput data (AF11, AF12, AF13)"),
    (12, "High-throughput data (AF11, AF12, AF13)"),
    (14, "High-throughput data (AF11, AF12, AF13)"),
];

pub fn dscp_class_name(dscp: u8) -> &'static str {
    DSCP_CLASSES
        .iter()
        .find(|(codepoint, _)| *codepoint == dscp)
        .map_or("Unknown", |(_, name)| *name)
}

/// A traffic-class / type-of-service byte split into DSCP and ECN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrafficClass(pub u8);

impl TrafficClass {
    pub fn dscp(self) -> u8 {
        self.0 >> 2
    }

    pub fn ecn(self) -> u8 {
        self.0 & 0x03
    }

    pub fn class_name(self) -> &'static str {
        dscp_class_name(self.dscp())
    }
}

impl fmt::Display for TrafficClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:#04x} DSCP: {} ({:#08b}) ECN: {:#04b}",
            self.0,
            self.class_name(),
            self.dscp(),
            self.ecn()
        )
    }
}
