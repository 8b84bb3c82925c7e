//! The application layer (Layer 7) modules.
//! DNS is decoded in full; HTTP and SNMP are pass-through records.

pub mod dns;
pub mod http;
pub mod snmp;

use std::fmt;

pub use dns::{DnsMessage, DnsProcessor, DnsRecord, DnsTcpProcessor};
pub use http::HttpMessage;
pub use snmp::SnmpMessage;

use super::{LayerError, ProtocolProcessor};

/// Application layer data types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationRecord<'a> {
    Dns(DnsMessage<'a>),
    Http(HttpMessage<'a>),
    Snmp(SnmpMessage<'a>),
    /// A payload routed to a text protocol that turned out not to be text.
    Opaque(&'a [u8]),
}

impl ApplicationRecord<'_> {
    pub fn protocol_name(&self) -> &'static str {
        match self {
            Self::Dns(_) => "DNS",
            Self::Http(_) => "HTTP",
            Self::Snmp(_) => "SNMP",
            Self::Opaque(_) => "Opaque",
        }
    }
}

/// Builds an HTTP record, or `Opaque` for binary payloads.
pub struct HttpProcessor;

impl<'a> ProtocolProcessor<'a> for HttpProcessor {
    type Record = ApplicationRecord<'a>;

    fn parse(&self, data: &'a [u8]) -> Result<ApplicationRecord<'a>, LayerError> {
        Ok(HttpMessage::from_payload(data)
            .map_or(ApplicationRecord::Opaque(data), ApplicationRecord::Http))
    }
}

pub struct SnmpProcessor;

impl<'a> ProtocolProcessor<'a> for SnmpProcessor {
    type Record = SnmpMessage<'a>;

    fn parse(&self, data: &'a [u8]) -> Result<SnmpMessage<'a>, LayerError> {
        Ok(SnmpMessage { payload: data })
    }
}

impl fmt::Display for ApplicationRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dns(dns) => dns.fmt(f),
            Self::Http(http) => http.fmt(f),
            Self::Snmp(snmp) => snmp.fmt(f),
            Self::Opaque(data) => {
                writeln!(f, "Application Data:")?;
                writeln!(f, "- Payload: ({} bytes) {}", data.len(), hex::encode(data))
            }
        }
    }
}
