use std::fmt;

/// An SNMP PDU on port 161 or a trap on 162. The BER body is not decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnmpMessage<'a> {
    pub payload: &'a [u8],
}

impl fmt::Display for SnmpMessage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SNMP Message:")?;
        writeln!(f, "- Payload: {} bytes", self.payload.len())
    }
}
