use byte_string::ByteStr;
use log::debug;
use tokio::io::AsyncWriteExt;

use socks5_endpoint::{Error, Reply, Socks5Endpoint};

/// A well-formed reply carrying an IPv4 bound address and `payload`
fn ipv4_reply(payload: &[u8]) -> Vec<u8> {
    let mut buf = vec![
        0x05, 0x00, // method selection, no-auth chosen
        0x05, 0x00, 0x00, 0x01, // reply header, succeeded, ATYP IPv4
        127, 0, 0, 1, 0x00, 0x35, // BND.ADDR, BND.PORT
    ];
    buf.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

#[test]
fn tcp_wrap_layout() {
    let _ = env_logger::try_init();

    let endpoint = Socks5Endpoint::new("example.com", 80).unwrap();
    let dest = endpoint.dest().to_vec();
    let payload = b"GET / HTTP/1.0\r\n\r\n";

    let frame = endpoint.tcp_wrap(payload).unwrap();
    assert_eq!(frame.len(), 8 + dest.len() + payload.len());

    assert_eq!(&frame[0..3], &[0x05, 0x01, 0x00]);
    assert_eq!(&frame[3..6], &[0x05, 0x01, 0x00]);
    assert_eq!(&frame[6..6 + dest.len()], &dest[..]);

    let len_off = 6 + dest.len();
    assert_eq!(
        &frame[len_off..len_off + 2],
        &(payload.len() as u16).to_be_bytes()
    );
    assert_eq!(&frame[len_off + 2..], &payload[..]);
}

#[test]
fn tcp_wrap_payload_too_large() {
    let endpoint = Socks5Endpoint::new("example.com", 80).unwrap();

    let payload = vec![0u8; 0xffff];
    assert!(endpoint.tcp_wrap(&payload).is_ok());

    let payload = vec![0u8; 0x1_0000];
    match endpoint.tcp_wrap(&payload) {
        Err(Error::PayloadTooLarge(n)) => assert_eq!(n, 0x1_0000),
        other => panic!("expected PayloadTooLarge, got {other:?}"),
    }
}

#[tokio::test]
async fn tcp_unwrap_whole_frame() {
    let _ = env_logger::try_init();

    let endpoint = Socks5Endpoint::new("127.0.0.1", 1080).unwrap();
    let reply = ipv4_reply(b"pong");

    let mut stream = &reply[..];
    let payload = endpoint.tcp_unwrap(&mut stream, 512).await.unwrap();
    assert_eq!(&payload[..], b"pong");
}

#[tokio::test]
async fn tcp_unwrap_byte_at_a_time() {
    let _ = env_logger::try_init();

    let endpoint = Socks5Endpoint::new("dns.google", 53).unwrap();
    let message = b"a dns response, more or less";
    let reply = ipv4_reply(message);

    // a 1-byte pipe forces the parser to suspend between every byte
    let (mut tx, mut rx) = tokio::io::duplex(1);
    let writer = tokio::spawn(async move {
        for b in reply {
            tx.write_all(&[b]).await.unwrap();
        }
    });

    let payload = endpoint.tcp_unwrap(&mut rx, 512).await.unwrap();
    debug!("received {:?}", ByteStr::new(&payload));
    assert_eq!(&payload[..], &message[..]);

    writer.await.unwrap();
}

#[tokio::test]
async fn tcp_unwrap_domain_bound_address() {
    let endpoint = Socks5Endpoint::new("example.com", 443).unwrap();

    let mut reply = vec![0x05, 0x00, 0x05, 0x00, 0x00, 0x03];
    reply.push(9); // BND.ADDR length
    reply.extend_from_slice(b"localhost");
    reply.extend_from_slice(&[0x04, 0x38]); // BND.PORT
    reply.extend_from_slice(&3u16.to_be_bytes());
    reply.extend_from_slice(b"abc");

    let mut stream = &reply[..];
    let payload = endpoint.tcp_unwrap(&mut stream, 64).await.unwrap();
    assert_eq!(&payload[..], b"abc");
}

#[tokio::test]
async fn tcp_unwrap_server_rejected() {
    let endpoint = Socks5Endpoint::new("example.com", 80).unwrap();

    let mut reply = ipv4_reply(b"");
    reply[3] = 0x05; // connection refused

    let mut stream = &reply[..];
    match endpoint.tcp_unwrap(&mut stream, 64).await {
        Err(Error::ServerRejected(reply)) => assert_eq!(reply, Reply::ConnectionRefused),
        other => panic!("expected ServerRejected, got {other:?}"),
    }
}

#[tokio::test]
async fn tcp_unwrap_bad_version() {
    let endpoint = Socks5Endpoint::new("example.com", 80).unwrap();

    let mut reply = ipv4_reply(b"");
    reply[0] = 0x04;

    let mut stream = &reply[..];
    match endpoint.tcp_unwrap(&mut stream, 64).await {
        Err(Error::ProtocolVersionMismatch(v)) => assert_eq!(v, 0x04),
        other => panic!("expected ProtocolVersionMismatch, got {other:?}"),
    }
}

#[tokio::test]
async fn tcp_unwrap_auth_required() {
    let endpoint = Socks5Endpoint::new("example.com", 80).unwrap();

    let mut reply = ipv4_reply(b"");
    reply[1] = 0x02; // username/password

    let mut stream = &reply[..];
    match endpoint.tcp_unwrap(&mut stream, 64).await {
        Err(Error::UnsupportedAuthMethod(m)) => assert_eq!(m, 0x02),
        other => panic!("expected UnsupportedAuthMethod, got {other:?}"),
    }
}

#[tokio::test]
async fn tcp_unwrap_unassigned_address_type() {
    let endpoint = Socks5Endpoint::new("example.com", 80).unwrap();

    let mut reply = ipv4_reply(b"");
    reply[5] = 0x02; // not assigned by RFC 1928

    let mut stream = &reply[..];
    match endpoint.tcp_unwrap(&mut stream, 64).await {
        Err(Error::UnsupportedAddressType(atyp)) => assert_eq!(atyp, 0x02),
        other => panic!("expected UnsupportedAddressType, got {other:?}"),
    }
}

#[tokio::test]
async fn tcp_unwrap_truncated_stream() {
    let endpoint = Socks5Endpoint::new("example.com", 80).unwrap();

    // closed before the length prefix arrives
    let reply = ipv4_reply(b"never delivered");

    let mut stream = &reply[..10];
    match endpoint.tcp_unwrap(&mut stream, 64).await {
        Err(Error::UnexpectedEof) => {}
        other => panic!("expected UnexpectedEof, got {other:?}"),
    }
}

#[tokio::test]
async fn tcp_unwrap_buffer_too_small() {
    let endpoint = Socks5Endpoint::new("example.com", 80).unwrap();

    let reply = ipv4_reply(&[0u8; 100]);

    let mut stream = &reply[..];
    match endpoint.tcp_unwrap(&mut stream, 10).await {
        Err(Error::BufferTooSmall { payload, capacity }) => {
            assert_eq!(payload, 100);
            assert_eq!(capacity, 10);
        }
        other => panic!("expected BufferTooSmall, got {other:?}"),
    }
}

#[tokio::test]
async fn tcp_unwrap_empty_payload() {
    let endpoint = Socks5Endpoint::new("example.com", 80).unwrap();
    let reply = ipv4_reply(b"");

    let mut stream = &reply[..];
    let payload = endpoint.tcp_unwrap(&mut stream, 64).await.unwrap();
    assert!(payload.is_empty());
}
