pub mod ethertype {
    pub const IPV4: u16 = 0x0800;
    pub const ARP: u16 = 0x0806;
    pub const RARP: u16 = 0x8035;
    pub const VLAN_8021Q: u16 = 0x8100;
    pub const IPV6: u16 = 0x86DD;
    pub const LLDP: u16 = 0x88CC;
}

pub mod ip_proto {
    pub const HOPOPT: u8 = 0;
    pub const ICMP: u8 = 1;
    pub const TCP: u8 = 6;
    pub const UDP: u8 = 17;
    pub const ROUTE: u8 = 43;
    pub const FRAGMENT: u8 = 44;
    pub const ESP: u8 = 50;
    pub const AH: u8 = 51;
    pub const ICMPV6: u8 = 58;
    pub const NO_NEXT: u8 = 59;
    pub const OPTS: u8 = 60;
    pub const MOBILITY: u8 = 135;
    pub const HIP: u8 = 139;
    pub const SHIM6: u8 = 140;
}

pub mod port {
    pub const DNS: u16 = 53;
    pub const HTTP: u16 = 80;
    pub const SNMP: u16 = 161;
    pub const SNMP_TRAP: u16 = 162;
}

pub fn ethertype_name(value: u16) -> &'static str {
    match value {
        ethertype::IPV4 => "IPv4",
        ethertype::ARP => "ARP",
        ethertype::RARP => "RARP",
        ethertype::VLAN_8021Q => "802.1Q",
        ethertype::IPV6 => "IPv6",
        ethertype::LLDP => "LLDP",
        _ => "Unknown",
    }
}

pub fn ip_protocol_name(value: u8) -> &'static str {
    match value {
        ip_proto::HOPOPT => "HOPOPT",
        ip_proto::ICMP => "ICMP",
        ip_proto::TCP => "TCP",
        ip_proto::UDP => "UDP",
        ip_proto::ROUTE => "Route",
        ip_proto::FRAGMENT => "Fragment",
        ip_proto::ESP => "Encapsulating Security Payload",
        ip_proto::AH => "Authentication Header",
        ip_proto::ICMPV6 => "ICMPv6",
        ip_proto::NO_NEXT => "NoNxt",
        ip_proto::OPTS => "Opts",
        ip_proto::MOBILITY => "Mobility",
        ip_proto::HIP => "Host Identity Protocol",
        ip_proto::SHIM6 => "Shim6 Protocol",
        _ => "Unknown",
    }
}
