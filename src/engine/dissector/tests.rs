use std::time::{Duration, SystemTime};

use super::*;
use crate::layer::LayerError;
use crate::layer::application::dns::DnsRecord;

const MAC_HEADER: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

fn ts() -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)
}

fn build_ethernet_frame(ethertype: u16, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(14 + payload.len());
    frame.extend_from_slice(&MAC_HEADER);
    frame.extend_from_slice(&ethertype.to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

fn build_ipv4(protocol: u8, payload: &[u8]) -> Vec<u8> {
    let total_len = (20 + payload.len()) as u16;
    let mut packet = vec![0x45, 0x00];
    packet.extend_from_slice(&total_len.to_be_bytes());
    packet.extend_from_slice(&[0x12, 0x34, 0x40, 0x00]); // id/flags
    packet.extend_from_slice(&[64, protocol, 0x00, 0x00]); // ttl/proto/checksum(dummy)
    packet.extend_from_slice(&[192, 168, 1, 10]);
    packet.extend_from_slice(&[192, 168, 1, 1]);
    packet.extend_from_slice(payload);
    packet
}

fn build_ipv6(next_header: u8, payload: &[u8]) -> Vec<u8> {
    let mut packet = vec![0x60, 0x00, 0x00, 0x00];
    packet.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    packet.extend_from_slice(&[next_header, 64]);
    packet.extend_from_slice(&[0xfe, 0x80, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]);
    packet.extend_from_slice(&[0xfe, 0x80, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2]);
    packet.extend_from_slice(payload);
    packet
}

fn build_udp(src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let mut datagram = Vec::new();
    datagram.extend_from_slice(&src_port.to_be_bytes());
    datagram.extend_from_slice(&dst_port.to_be_bytes());
    datagram.extend_from_slice(&((8 + payload.len()) as u16).to_be_bytes());
    datagram.extend_from_slice(&[0x00, 0x00]);
    datagram.extend_from_slice(payload);
    datagram
}

fn build_tcp(src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let mut segment = Vec::new();
    segment.extend_from_slice(&src_port.to_be_bytes());
    segment.extend_from_slice(&dst_port.to_be_bytes());
    segment.extend_from_slice(&[0, 0, 0, 1, 0, 0, 0, 2]); // seq/ack
    segment.extend_from_slice(&[0x50, 0x18, 0x10, 0x00]); // data offset/flags/window
    segment.extend_from_slice(&[0, 0, 0, 0]); // checksum/urg
    segment.extend_from_slice(payload);
    segment
}

fn build_dns_query() -> Vec<u8> {
    let mut message = vec![
        0x12, 0x34, 0x01, 0x00, // id/flags
        0x00, 0x01, 0x00, 0x00, // qd/an
        0x00, 0x00, 0x00, 0x00, // ns/ar
    ];
    message.extend_from_slice(b"\x07example\x03com\x00");
    message.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
    message
}

fn first_dns_name(dissection: &Dissection<'_>) -> String {
    match &dissection.application {
        Some(ApplicationRecord::Dns(dns)) => match dns.records.first() {
            Some(DnsRecord::Question(question)) => question.name.clone(),
            other => panic!("expected a question, got {other:?}"),
        },
        other => panic!("expected DNS, got {other:?}"),
    }
}

#[test]
fn test_dns_over_udp_decodes_every_layer() {
    let frame = build_ethernet_frame(0x0800, &build_ipv4(17, &build_udp(40000, 53, &build_dns_query())));

    let dissection = Dissector::new().decode(&frame, ts()).expect("decode should succeed");
    assert!(dissection.link.is_some());
    assert!(matches!(dissection.network, Some(NetworkRecord::Ipv4(_))));
    assert!(matches!(dissection.transport, Some(TransportRecord::Udp(_))));
    assert_eq!(first_dns_name(&dissection), "example.com.");
    assert_eq!(dissection.termination, Termination::Complete);
    assert_eq!(dissection.depth(), 4);
    assert_eq!(dissection.timestamp, ts());
}

#[test]
fn test_dns_over_tcp_strips_length_prefix() {
    let query = build_dns_query();
    let mut payload = (query.len() as u16).to_be_bytes().to_vec();
    payload.extend_from_slice(&query);
    let frame = build_ethernet_frame(0x0800, &build_ipv4(6, &build_tcp(53000, 53, &payload)));

    let dissection = Dissector::new().decode(&frame, ts()).expect("decode should succeed");
    assert_eq!(first_dns_name(&dissection), "example.com.");
}

#[test]
fn test_response_from_well_known_source_port() {
    let frame = build_ethernet_frame(0x0800, &build_ipv4(17, &build_udp(53, 40000, &build_dns_query())));

    let dissection = Dissector::new().decode(&frame, ts()).expect("decode should succeed");
    assert!(matches!(dissection.application, Some(ApplicationRecord::Dns(_))));
}

#[test]
fn test_http_over_ipv6() {
    let request = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let frame = build_ethernet_frame(0x86DD, &build_ipv6(6, &build_tcp(51000, 80, request)));

    let dissection = Dissector::new().decode(&frame, ts()).expect("decode should succeed");
    assert!(matches!(dissection.network, Some(NetworkRecord::Ipv6(_))));
    match dissection.application {
        Some(ApplicationRecord::Http(http)) => assert_eq!(http.start_line(), "GET / HTTP/1.1"),
        other => panic!("expected HTTP, got {other:?}"),
    }
}

#[test]
fn test_snmp_trap_summary() {
    let frame = build_ethernet_frame(0x0800, &build_ipv4(17, &build_udp(1024, 162, &[0x30, 0x03, 0x02, 0x01, 0x00])));

    let dissection = Dissector::new().decode(&frame, ts()).expect("decode should succeed");
    match dissection.application {
        Some(ApplicationRecord::Snmp(snmp)) => assert_eq!(snmp.payload.len(), 5),
        other => panic!("expected SNMP, got {other:?}"),
    }
}

#[test]
fn test_truncated_frame_has_no_records() {
    let failure = Dissector::new()
        .decode(&[0x00, 0x01, 0x02], ts())
        .expect_err("3 bytes cannot hold an Ethernet header");

    assert_eq!(failure.error.layer, Layer::Link);
    assert!(matches!(
        failure.error.source,
        LayerError::TruncatedHeader { needed: 14, available: 3, .. }
    ));
    assert_eq!(failure.partial.depth(), 0);
    assert_eq!(failure.partial.termination, Termination::Failed { layer: Layer::Link });
}

#[test]
fn test_ipv4_header_overrun_keeps_link_record() {
    let mut packet = build_ipv4(6, &[]);
    packet[0] = 0x46; // 24-byte header, 20 present

    let frame = build_ethernet_frame(0x0800, &packet);
    let failure = Dissector::new()
        .decode(&frame, ts())
        .expect_err("IHL beyond buffer must fail");

    assert_eq!(failure.error.layer, Layer::Network);
    assert!(matches!(
        failure.error.source,
        LayerError::InvalidDeclaredLength { declared: 24, available: 20, .. }
    ));
    let (_, partial) = failure.into_parts();
    assert!(partial.link.is_some());
    assert!(partial.network.is_none());
    assert!(partial.transport.is_none());
}

#[test]
fn test_transport_failure_keeps_network_record() {
    let mut datagram = build_udp(1000, 53, &[]);
    datagram[4..6].copy_from_slice(&4u16.to_be_bytes());

    let frame = build_ethernet_frame(0x0800, &build_ipv4(17, &datagram));
    let failure = Dissector::new()
        .decode(&frame, ts())
        .expect_err("UDP length below 8 must fail");

    assert_eq!(failure.error.layer, Layer::Transport);
    assert!(failure.partial.network.is_some());
    assert!(failure.partial.transport.is_none());
    assert_eq!(failure.partial.depth(), 2);
}

#[test]
fn test_malformed_dns_fails_at_application_layer() {
    let mut query = build_dns_query();
    query.truncate(15);

    let frame = build_ethernet_frame(0x0800, &build_ipv4(17, &build_udp(40000, 53, &query)));
    let failure = Dissector::new()
        .decode(&frame, ts())
        .expect_err("label overrun must fail");

    assert_eq!(failure.error.layer, Layer::Application);
    assert_eq!(failure.partial.depth(), 3);
}

#[test]
fn test_unknown_ethertype_stops_cleanly() {
    let frame = build_ethernet_frame(0x88CC, &[0x02, 0x07, 0x04]);

    let dissection = Dissector::new().decode(&frame, ts()).expect("not an error");
    assert!(dissection.link.is_some());
    assert!(dissection.network.is_none());
    assert_eq!(
        dissection.termination,
        Termination::UnsupportedProtocol {
            layer: Layer::Network,
            value: 0x88CC
        }
    );
    assert!(!dissection.is_complete());
}

#[test]
fn test_icmpv4_number_inside_ipv6_is_unsupported() {
    let frame = build_ethernet_frame(0x86DD, &build_ipv6(1, &[8, 0, 0, 0, 0, 1, 0, 1]));

    let dissection = Dissector::new().decode(&frame, ts()).expect("not an error");
    assert!(dissection.network.is_some());
    assert_eq!(
        dissection.termination,
        Termination::UnsupportedProtocol {
            layer: Layer::Transport,
            value: 1
        }
    );
}

#[test]
fn test_unregistered_port_stops_after_transport() {
    let frame = build_ethernet_frame(0x0800, &build_ipv4(6, &build_tcp(50000, 443, &[0x16, 0x03, 0x01])));

    let dissection = Dissector::new().decode(&frame, ts()).expect("not an error");
    assert!(dissection.transport.is_some());
    assert!(dissection.application.is_none());
    assert_eq!(
        dissection.termination,
        Termination::UnsupportedProtocol {
            layer: Layer::Application,
            value: 443
        }
    );
}

#[test]
fn test_empty_segment_skips_application() {
    let frame = build_ethernet_frame(0x0800, &build_ipv4(6, &build_tcp(50000, 80, &[])));

    let dissection = Dissector::new().decode(&frame, ts()).expect("decode should succeed");
    assert!(dissection.application.is_none());
    assert!(dissection.is_complete());
}

#[test]
fn test_icmp_echo_ends_chain() {
    let echo = [0x08, 0x00, 0x12, 0x34, 0x00, 0x01, 0x00, 0x01, 0xde, 0xad, 0xbe, 0xef];
    let frame = build_ethernet_frame(0x0800, &build_ipv4(1, &echo));

    let dissection = Dissector::new().decode(&frame, ts()).expect("decode should succeed");
    assert!(matches!(dissection.transport, Some(TransportRecord::Icmp(_))));
    assert!(dissection.application.is_none());
    assert!(dissection.is_complete());
}

#[test]
fn test_icmpv6_echo_over_ipv6() {
    let frame = build_ethernet_frame(0x86DD, &build_ipv6(58, &[128, 0, 0, 0, 0, 1, 0, 1]));

    let dissection = Dissector::new().decode(&frame, ts()).expect("decode should succeed");
    assert!(matches!(dissection.transport, Some(TransportRecord::Icmpv6(_))));
    assert!(dissection.is_complete());
}

#[test]
fn test_arp_has_no_successor() {
    let arp = [
        0x00, 0x01, 0x08, 0x00, 6, 4, 0x00, 0x01, // htype/ptype/hlen/plen/op
        0, 1, 2, 3, 4, 5, 192, 168, 1, 10, // sender
        0, 0, 0, 0, 0, 0, 192, 168, 1, 1, // target
    ];
    let frame = build_ethernet_frame(0x0806, &arp);

    let dissection = Dissector::new().decode(&frame, ts()).expect("decode should succeed");
    assert!(matches!(dissection.network, Some(NetworkRecord::Arp(_))));
    assert!(dissection.transport.is_none());
    assert!(dissection.is_complete());
}

#[test]
fn test_records_render_in_chain_order() {
    let frame = build_ethernet_frame(0x0800, &build_ipv4(17, &build_udp(40000, 53, &build_dns_query())));

    let dissection = Dissector::new().decode(&frame, ts()).expect("decode should succeed");
    let headings: Vec<String> = dissection
        .records()
        .map(|record| record.to_string().lines().next().unwrap_or_default().to_owned())
        .collect();
    assert_eq!(
        headings,
        ["Ethernet Frame:", "IPv4 Packet:", "UDP Segment:", "DNS Message:"]
    );
}

#[test]
fn test_decode_frame_uses_frame_timestamp() {
    let bytes = build_ethernet_frame(0x88CC, &[]);
    let frame = Frame::new(&bytes, ts());

    let dissection = Dissector::new().decode_frame(&frame).expect("not an error");
    assert_eq!(dissection.timestamp, ts());
}

#[test]
fn test_payload_views_lie_inside_frame() {
    let bytes = build_ethernet_frame(0x0800, &build_ipv4(17, &build_udp(40000, 53, &build_dns_query())));
    let frame = Frame::new(&bytes, ts());

    let dissection = Dissector::new().decode_frame(&frame).expect("decode should succeed");
    let link = dissection.link.as_ref().expect("link record");
    let network = dissection.network.as_ref().expect("network record");
    let transport = dissection.transport.as_ref().expect("transport record");
    let Some(ApplicationRecord::Dns(dns)) = &dissection.application else {
        panic!("expected DNS");
    };

    assert_eq!(frame.offset_of(link.payload), Some(14));
    assert_eq!(frame.offset_of(network.payload()), Some(34));
    assert_eq!(frame.offset_of(transport.payload()), Some(42));
    assert_eq!(frame.offset_of(dns.message()), Some(42));
    assert_eq!(dns.message().len(), bytes.len() - 42);
}

#[test]
fn test_tcp_dns_message_view_skips_length_prefix() {
    let query = build_dns_query();
    let mut payload = (query.len() as u16).to_be_bytes().to_vec();
    payload.extend_from_slice(&query);
    let bytes = build_ethernet_frame(0x0800, &build_ipv4(6, &build_tcp(53000, 53, &payload)));
    let frame = Frame::new(&bytes, ts());

    let dissection = Dissector::new().decode_frame(&frame).expect("decode should succeed");
    let Some(ApplicationRecord::Dns(dns)) = &dissection.application else {
        panic!("expected DNS");
    };
    assert_eq!(frame.offset_of(dns.message()), Some(14 + 20 + 20 + 2));
}
