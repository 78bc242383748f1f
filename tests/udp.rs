use socks5_endpoint::{Error, Socks5Endpoint};

fn roundtrip(host: &str, port: u16, packet: &[u8]) {
    let endpoint = Socks5Endpoint::new(host, port).unwrap();

    let frame = endpoint.udp_wrap(packet);
    assert_eq!(frame.len(), 3 + endpoint.dest().len() + packet.len());
    assert_eq!(&frame[0..3], &[0x00, 0x00, 0x00]);
    assert_eq!(&frame[3..3 + endpoint.dest().len()], endpoint.dest());

    let payload = Socks5Endpoint::udp_unwrap(&frame).unwrap();
    assert_eq!(payload, packet);
}

#[test]
fn udp_roundtrip_ipv4() {
    let _ = env_logger::try_init();
    roundtrip("8.8.8.8", 53, b"a dns query");
}

#[test]
fn udp_roundtrip_ipv6() {
    roundtrip("2001:4860:4860::8888", 53, b"a dns query");
}

#[test]
fn udp_roundtrip_domain() {
    roundtrip("dns.google", 53, b"a dns query");
}

#[test]
fn udp_roundtrip_empty_payload() {
    roundtrip("dns.google", 53, b"");
}

#[test]
fn udp_unwrap_unassigned_address_type() {
    let datagram = [0x00, 0x00, 0x00, 0x02, 0, 0, 0, 0, 0, 0];
    match Socks5Endpoint::udp_unwrap(&datagram) {
        Err(Error::UnsupportedAddressType(atyp)) => assert_eq!(atyp, 0x02),
        other => panic!("expected UnsupportedAddressType, got {other:?}"),
    }
}

#[test]
fn udp_unwrap_truncated_header() {
    // IPv4 header needs 4 + 1 + 4 + 2 bytes
    let datagram = [0x00, 0x00, 0x00, 0x01, 127, 0, 0, 1];
    match Socks5Endpoint::udp_unwrap(&datagram) {
        Err(Error::UnexpectedEof) => {}
        other => panic!("expected UnexpectedEof, got {other:?}"),
    }

    match Socks5Endpoint::udp_unwrap(&[0x00, 0x00]) {
        Err(Error::UnexpectedEof) => {}
        other => panic!("expected UnexpectedEof, got {other:?}"),
    }
}

#[test]
fn udp_unwrap_header_only_datagram() {
    let endpoint = Socks5Endpoint::new("127.0.0.1", 1080).unwrap();
    let frame = endpoint.udp_wrap(b"");
    let payload = Socks5Endpoint::udp_unwrap(&frame).unwrap();
    assert!(payload.is_empty());
}
