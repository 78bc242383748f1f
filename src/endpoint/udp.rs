//! UDP relay framing
//!
//! Each datagram carries its own complete header, so both directions are
//! single-pass transforms with no suspension and no length prefix.

use bytes::{BufMut, Bytes, BytesMut};
use log::trace;

use crate::socks5::{consts, Error};

use super::Socks5Endpoint;

/// RSV (2) + FRAG (1)
const UDP_HEADER_PREFIX: usize = 3;

impl Socks5Endpoint {
    /// Prepend the UDP ASSOCIATE header to one datagram payload
    ///
    /// ```plain
    /// +----+------+------+----------+----------+----------+
    /// |RSV | FRAG | ATYP | DST.ADDR | DST.PORT |   DATA   |
    /// +----+------+------+----------+----------+----------+
    /// | 2  |  1   |  1   | Variable |    2     | Variable |
    /// +----+------+------+----------+----------+----------+
    /// ```
    ///
    /// Fragmentation is not supported, FRAG is always zero.
    pub fn udp_wrap(&self, packet: &[u8]) -> Bytes {
        let mut buf = BytesMut::with_capacity(UDP_HEADER_PREFIX + self.dest.len() + packet.len());
        buf.put_slice(&[0x00, 0x00, 0x00]);
        buf.put_slice(&self.dest);
        buf.put_slice(packet);
        buf.freeze()
    }

    /// Locate the payload of one received datagram
    ///
    /// Skips the fixed prefix and the variable-length bound address; the
    /// rest of the datagram is the payload. Datagrams shorter than their
    /// own header fail with [`Error::UnexpectedEof`].
    pub fn udp_unwrap(packet: &[u8]) -> Result<&[u8], Error> {
        if packet.len() < UDP_HEADER_PREFIX + 1 {
            return Err(Error::UnexpectedEof);
        }

        let addr_len = match packet[3] {
            consts::SOCKS5_ADDR_TYPE_IPV4 => 4,
            consts::SOCKS5_ADDR_TYPE_IPV6 => 16,
            consts::SOCKS5_ADDR_TYPE_DOMAIN_NAME => match packet.get(4) {
                Some(&len) => 1 + len as usize,
                None => return Err(Error::UnexpectedEof),
            },
            atyp => return Err(Error::UnsupportedAddressType(atyp)),
        };

        // prefix + ATYP + address + port
        let data_offset = UDP_HEADER_PREFIX + 1 + addr_len + 2;
        if packet.len() < data_offset {
            return Err(Error::UnexpectedEof);
        }

        trace!(
            "unwrapped UDP datagram, atyp {:#x}, payload {} bytes",
            packet[3],
            packet.len() - data_offset
        );

        Ok(&packet[data_offset..])
    }
}
